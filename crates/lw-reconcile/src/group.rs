//! Arrange comparison rows by match for display.

use lw_schemas::{ComparisonRow, MatchGroup, MatchGroups};

use crate::engine::DiscoveredMatch;
use crate::matcher::{assign_side, clean_team_name, side_of, Side};

/// Bucket for rows that belong to none of the discovered matches.
pub const OTHER_BUCKET: &str = "Other";

/// Group rows, degrading with the structure available:
///
/// 1. discovered matches: one group per match, side one before side two,
///    leftovers in [`OTHER_BUCKET`];
/// 2. a single known match (manual override): every row in one group;
/// 3. nothing known: one group per team, largest team first.
///
/// Every row lands in exactly one group.
pub fn group_rows(
    rows: &[ComparisonRow],
    matches: &[DiscoveredMatch],
    match_teams: &[String],
) -> MatchGroups {
    if !matches.is_empty() {
        by_matches(rows, matches)
    } else if match_teams.len() >= 2 {
        single_bucket(rows, &match_teams[0], &match_teams[1])
    } else {
        by_team(rows)
    }
}

fn unique_key(groups: &[MatchGroup], base: &str) -> String {
    if !groups.iter().any(|g| g.key == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base} ({n})"))
        .find(|k| !groups.iter().any(|g| &g.key == k))
        .unwrap_or_else(|| base.to_string())
}

fn by_matches(rows: &[ComparisonRow], matches: &[DiscoveredMatch]) -> MatchGroups {
    let mut assigned = vec![false; rows.len()];
    let mut groups: Vec<MatchGroup> = Vec::new();

    for m in matches {
        let (t1, t2) = (&m.teams[0], &m.teams[1]);
        let mut side_one = Vec::new();
        let mut side_two = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            if assigned[i] {
                continue;
            }
            let Some(team) = row.team.as_deref() else {
                continue;
            };
            match side_of(team, t1, t2) {
                Some(Side::One) => side_one.push(row.clone()),
                Some(Side::Two) => side_two.push(row.clone()),
                None => continue,
            }
            assigned[i] = true;
        }

        side_one.extend(side_two);
        let key = unique_key(&groups, &format!("{t1} vs {t2}"));
        groups.push(MatchGroup {
            key,
            teams: vec![t1.clone(), t2.clone()],
            players: side_one,
        });
    }

    let leftovers: Vec<ComparisonRow> = rows
        .iter()
        .zip(&assigned)
        .filter(|(_, done)| !**done)
        .map(|(r, _)| r.clone())
        .collect();
    if !leftovers.is_empty() {
        let key = unique_key(&groups, OTHER_BUCKET);
        groups.push(MatchGroup {
            key,
            teams: Vec::new(),
            players: leftovers,
        });
    }
    MatchGroups(groups)
}

fn single_bucket(rows: &[ComparisonRow], t1: &str, t2: &str) -> MatchGroups {
    let (mut one, mut two): (Vec<_>, Vec<_>) = (Vec::new(), Vec::new());
    for row in rows {
        match assign_side(row.team.as_deref(), t1, t2) {
            Side::One => one.push(row.clone()),
            Side::Two => two.push(row.clone()),
        }
    }
    one.extend(two);
    MatchGroups(vec![MatchGroup {
        key: format!("{t1} vs {t2}"),
        teams: vec![t1.to_string(), t2.to_string()],
        players: one,
    }])
}

fn by_team(rows: &[ComparisonRow]) -> MatchGroups {
    let mut groups: Vec<MatchGroup> = Vec::new();
    for row in rows {
        let team = row
            .team
            .as_deref()
            .map(clean_team_name)
            .filter(|t| !t.is_empty())
            .unwrap_or(OTHER_BUCKET);
        match groups.iter_mut().find(|g| g.key == team) {
            Some(g) => g.players.push(row.clone()),
            None => groups.push(MatchGroup {
                key: team.to_string(),
                teams: vec![team.to_string()],
                players: vec![row.clone()],
            }),
        }
    }
    // stable: ties keep first-seen order
    groups.sort_by(|a, b| b.players.len().cmp(&a.players.len()));
    MatchGroups(groups)
}
