//! Plain-text rendering for the CLI.

use std::fmt::Write as _;

use lw_schemas::{ComparisonRow, PlayerReport, Progress, SlateComparison};

/// How an average sits relative to the posted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Over,
    Under,
    Push,
}

impl Marker {
    pub fn of(avg: f64, line: f64) -> Self {
        if avg > line {
            Marker::Over
        } else if avg < line {
            Marker::Under
        } else {
            Marker::Push
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Marker::Over => "+",
            Marker::Under => "-",
            Marker::Push => "=",
        }
    }
}

/// `21.5 +` style cell; `N/A` when either side is missing.
pub fn avg_cell(avg: Option<f64>, line: Option<f64>) -> String {
    match (avg, line) {
        (Some(a), Some(l)) => format!("{a:.2} {}", Marker::of(a, l).symbol()),
        (Some(a), None) => format!("{a:.2}"),
        (None, _) => "N/A".to_string(),
    }
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|n| format!("{n:.2}")).unwrap_or_else(|| "N/A".to_string())
}

fn row_line(out: &mut String, row: &ComparisonRow) {
    let team = row.team.as_deref().unwrap_or("N/A");
    let line = row.line.map(|l| l.to_string()).unwrap_or_else(|| "N/A".into());
    if let Some(err) = &row.error {
        let _ = writeln!(out, "{:<18} {:<18} {:>6}  {err}", row.player, team, line);
        return;
    }
    let _ = writeln!(
        out,
        "{:<18} {:<18} {:>6}  {:>9} {:>9} {:>9}  {}/{}",
        row.player,
        team,
        line,
        avg_cell(row.avg_last_5, row.line),
        avg_cell(row.avg_last_10, row.line),
        avg_cell(row.avg_last_25, row.line),
        row.odds_over,
        row.odds_under,
    );
}

/// Slate table, one section per match group.
pub fn render_comparison(cmp: &SlateComparison) -> String {
    let mut out = String::new();
    if let Some(url) = &cmp.match_url {
        let _ = writeln!(out, "match: {url}");
    }
    let header = format!(
        "{:<18} {:<18} {:>6}  {:>9} {:>9} {:>9}  {}",
        "PLAYER", "TEAM", "LINE", "LAST 5", "LAST 10", "LAST 25", "ODDS O/U"
    );

    for group in &cmp.players_by_match.0 {
        let _ = writeln!(out, "\n== {} ({})", group.key, group.teams.join(" vs "));
        let _ = writeln!(out, "{header}");
        for row in &group.players {
            row_line(&mut out, row);
        }
    }

    let failed = cmp.players.iter().filter(|r| r.is_error()).count();
    let _ = writeln!(
        out,
        "\n{} players, {} resolved, {} failed",
        cmp.row_count(),
        cmp.row_count() - failed,
        failed
    );
    out
}

pub fn render_report(report: &PlayerReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "-".repeat(60));
    let _ = writeln!(out, "Player found: {}", report.player);
    let _ = writeln!(out, "Current Team: {}", report.team.as_deref().unwrap_or("N/A"));
    let _ = writeln!(out, "VLR Profile: {}", report.vlr_url);
    let _ = writeln!(out, "{}", "-".repeat(60));

    for m in &report.matches {
        let maps: Vec<String> = m
            .map_kills
            .iter()
            .map(|mk| format!("{} {} {}", mk.map, mk.agent, mk.kills))
            .collect();
        let _ = writeln!(
            out,
            "{:<12} {:<36} {:>3}  {}",
            m.date,
            m.title,
            m.total_kills,
            maps.join(" | ")
        );
    }

    let _ = writeln!(out, "\n{} matches with exactly 2 maps", report.matches_found);
    let _ = writeln!(out, "Last 5 Match Kills (Map 1+2): {}", opt_num(report.averages.last_5));
    let _ = writeln!(out, "Last 10 Match Kills (Map 1+2): {}", opt_num(report.averages.last_10));
    let _ = writeln!(out, "Last 25 Match Kills (Map 1+2): {}", opt_num(report.averages.last_25));
    if let Some(err) = &report.error {
        let _ = writeln!(out, "{err}");
    }

    // Widest window first; the profile page leads with it too.
    if let Some(span) = report
        .agent_stats
        .iter()
        .find(|t| t.timespan == "all")
        .or_else(|| report.agent_stats.last())
    {
        let _ = writeln!(out, "\nAgents ({}):", span.timespan);
        let _ = writeln!(
            out,
            "{:<10} {:>6} {:>6} {:>6} {:>5} {:>5}  {:>5}/{:<5}",
            "AGENT", "ROUNDS", "RATING", "ACS", "K:D", "KAST", "K", "D"
        );
        for a in &span.agents {
            let _ = writeln!(
                out,
                "{:<10} {:>6} {:>6.2} {:>6.1} {:>5.2} {:>5}  {:>5}/{:<5}",
                a.agent, a.rounds, a.rating, a.acs, a.kd, a.kast, a.kills, a.deaths
            );
        }
    }
    out
}

/// Progress lines on stderr so stdout stays the result.
#[derive(Debug, Default)]
pub struct StderrProgress {
    current: usize,
    total: usize,
}

impl Progress for StderrProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        eprintln!("[*] {total} players on the slate");
    }

    fn log(&mut self, msg: &str) {
        eprintln!("[*] {msg}");
    }

    fn item_done(&mut self, detail: &str) {
        self.current += 1;
        eprintln!("[{}/{}] {detail}", self.current, self.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lw_schemas::{AgentStats, AgentTimespan, Averages, MatchGroup, MatchGroups, SlateEntry};

    #[test]
    fn markers_compare_against_line() {
        assert_eq!(Marker::of(22.0, 20.5), Marker::Over);
        assert_eq!(Marker::of(19.0, 20.5), Marker::Under);
        assert_eq!(Marker::of(20.5, 20.5), Marker::Push);
        assert_eq!(avg_cell(Some(22.0), Some(20.5)), "22.00 +");
        assert_eq!(avg_cell(None, Some(20.5)), "N/A");
        assert_eq!(avg_cell(Some(18.25), None), "18.25");
    }

    #[test]
    fn comparison_lists_groups_and_failures() {
        let ok = ComparisonRow {
            avg_last_5: Some(40.0),
            avg_last_10: Some(30.0),
            avg_last_25: None,
            error: None,
            ..ComparisonRow::failed(&SlateEntry::new("zekken", Some(35.5)), "")
        };
        let bad = ComparisonRow::failed(&SlateEntry::new("ghost", Some(30.5)), "Player not found on VLR.gg");
        let cmp = SlateComparison {
            players: vec![ok.clone(), bad.clone()],
            players_by_match: MatchGroups(vec![MatchGroup {
                key: "Sentinels vs NRG".into(),
                teams: vec!["Sentinels".into(), "NRG".into()],
                players: vec![ok, bad],
            }]),
            match_teams: vec!["Sentinels".into(), "NRG".into()],
            match_url: None,
        };

        let text = render_comparison(&cmp);
        assert!(text.contains("== Sentinels vs NRG (Sentinels vs NRG)"));
        assert!(text.contains("40.00 +"));
        assert!(text.contains("30.00 -"));
        assert!(text.contains("Player not found on VLR.gg"));
        assert!(text.contains("2 players, 1 resolved, 1 failed"));
    }

    #[test]
    fn report_shows_all_time_agents_and_error() {
        let jett = AgentStats {
            agent: "Jett".into(),
            rounds: 120,
            kd: 1.25,
            kast: "71%".into(),
            kills: 100,
            deaths: 80,
            ..AgentStats::default()
        };
        let report = PlayerReport {
            player: "zekken".into(),
            team: None,
            team_url: None,
            vlr_url: "https://vlr.test/player/1/zekken".into(),
            matches: Vec::new(),
            averages: Averages::default(),
            matches_found: 0,
            agent_stats: vec![
                AgentTimespan {
                    timespan: "30d".into(),
                    agents: vec![AgentStats { agent: "Raze".into(), ..AgentStats::default() }],
                },
                AgentTimespan {
                    timespan: "all".into(),
                    agents: vec![jett],
                },
            ],
            error: Some("No match history found".into()),
        };

        let text = render_report(&report);
        assert!(text.contains("Current Team: N/A"));
        assert!(text.contains("No match history found"));
        assert!(text.contains("Agents (all):"));
        assert!(text.contains("Jett"));
        assert!(text.contains("1.25"));
        assert!(!text.contains("Raze"));
    }
}
