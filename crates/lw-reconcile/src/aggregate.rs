//! Match records and rolling averages.
//!
//! Pure functions over already-fetched data. The per-record statistic is
//! `MatchRecord::total_kills`, the sum over the first [`EARLY_MAPS`] maps.

use lw_schemas::{Averages, MapKills, MatchRecord};
use lw_sources::MapRow;

/// Maps per match that count towards the statistic.
pub const EARLY_MAPS: usize = 2;

/// Rolling-average window sizes reported for every player.
pub const WINDOWS: [usize; 3] = [5, 10, 25];

/// Fold per-map rows into one record per match.
///
/// Rows are grouped by match URL in first-seen order; only the first
/// [`EARLY_MAPS`] maps of a match are kept. A match qualifies when it has
/// exactly that many maps and a non-zero total.
pub fn build_records(rows: &[MapRow]) -> Vec<MatchRecord> {
    let mut order: Vec<&str> = Vec::new();
    let mut buckets: Vec<(&MapRow, Vec<MapKills>)> = Vec::new();

    for row in rows {
        let idx = match order.iter().position(|u| *u == row.match_url) {
            Some(i) => i,
            None => {
                order.push(&row.match_url);
                buckets.push((row, Vec::new()));
                order.len() - 1
            }
        };
        let maps = &mut buckets[idx].1;
        if maps.len() < EARLY_MAPS {
            maps.push(MapKills {
                map: row.map.clone(),
                agent: row.agent.clone(),
                kills: row.kills,
            });
        }
    }

    buckets
        .into_iter()
        .filter(|(_, maps)| maps.len() == EARLY_MAPS)
        .map(|(first, maps)| {
            MatchRecord::new(&first.match_title, &first.match_date, &first.match_url, maps)
        })
        .filter(|r| r.total_kills > 0)
        .collect()
}

/// Mean of `total_kills` over the first `min(k, m)` records.
///
/// `None` when there are no records (or `k == 0`).
pub fn rolling_average(records: &[MatchRecord], k: usize) -> Option<f64> {
    let window = &records[..k.min(records.len())];
    if window.is_empty() {
        return None;
    }
    let sum: u64 = window.iter().map(|r| u64::from(r.total_kills)).sum();
    Some(sum as f64 / window.len() as f64)
}

/// 5/10/25 averages rounded to two decimals.
pub fn averages(records: &[MatchRecord]) -> Averages {
    let at = |k| rolling_average(records, k).map(round2);
    Averages {
        last_5: at(WINDOWS[0]),
        last_10: at(WINDOWS[1]),
        last_25: at(WINDOWS[2]),
    }
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(total: u32) -> MatchRecord {
        let a = total / 2;
        MatchRecord::new(
            "A vs B",
            "2025-01-01",
            format!("https://www.vlr.gg/{total}/x"),
            vec![
                MapKills {
                    map: "Ascent".into(),
                    agent: "Jett".into(),
                    kills: a,
                },
                MapKills {
                    map: "Bind".into(),
                    agent: "Jett".into(),
                    kills: total - a,
                },
            ],
        )
    }

    fn row(url: &str, map: &str, kills: u32) -> MapRow {
        MapRow {
            map: map.into(),
            agent: "Sova".into(),
            kills,
            match_url: url.into(),
            match_title: format!("title {url}"),
            match_date: "2025-02-02".into(),
        }
    }

    #[test]
    fn window_semantics_around_k() {
        let k = 5;
        // m = 0
        assert_eq!(rolling_average(&[], k), None);
        // m = 1
        assert_eq!(rolling_average(&[rec(30)], k), Some(30.0));
        // m = k - 1: all available records
        let four: Vec<_> = [10, 20, 30, 40].into_iter().map(rec).collect();
        assert_eq!(rolling_average(&four, k), Some(25.0));
        // m = k
        let five: Vec<_> = [10, 20, 30, 40, 50].into_iter().map(rec).collect();
        assert_eq!(rolling_average(&five, k), Some(30.0));
        // m = k + 1: only the leading k count
        let six: Vec<_> = [10, 20, 30, 40, 50, 1000].into_iter().map(rec).collect();
        assert_eq!(rolling_average(&six, k), Some(30.0));
    }

    #[test]
    fn zero_window_is_absent() {
        assert_eq!(rolling_average(&[rec(10)], 0), None);
    }

    #[test]
    fn averages_are_rounded() {
        let recs: Vec<_> = [10, 10, 11].into_iter().map(rec).collect();
        let a = averages(&recs);
        assert_eq!(a.last_5, Some(10.33));
        assert_eq!(a.last_10, Some(10.33));
        assert_eq!(a.last_25, Some(10.33));
        assert_eq!(averages(&[]), Averages::default());
    }

    #[test]
    fn records_keep_first_two_maps_and_drop_short_matches() {
        let rows = vec![
            row("m1", "Ascent", 20),
            row("m1", "Bind", 15),
            row("m1", "Haven", 99),
            row("m2", "Lotus", 18),
            row("m3", "Split", 0),
            row("m3", "Icebox", 0),
            row("m4", "Pearl", 12),
            row("m4", "Sunset", 13),
        ];
        let recs = build_records(&rows);
        let urls: Vec<_> = recs.iter().map(|r| r.match_url.as_str()).collect();
        assert_eq!(urls, vec!["m1", "m4"]);
        assert_eq!(recs[0].total_kills, 35);
        assert_eq!(recs[0].map_kills.len(), 2);
        assert_eq!(recs[0].title, "title m1");
        assert_eq!(recs[1].total_kills, 25);
    }
}
