//! Per-agent tables and their combined row.

use lw_schemas::AgentStats;

use crate::aggregate::round2;

/// Profile timespans queried for a player report, narrowest first.
pub const AGENT_TIMESPANS: [&str; 4] = ["30d", "60d", "90d", "all"];

/// Label of the combined row appended to a non-empty table.
pub const OVERALL: &str = "Overall";

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        round2(sum / n as f64)
    }
}

/// Combined row: counts are summed, K/D is recomputed from the sums, rate
/// stats are the unweighted mean over agents. KAST is averaged over the
/// rows whose percentage parses and rounded to a whole percent.
pub fn overall_row(agents: &[AgentStats]) -> Option<AgentStats> {
    if agents.is_empty() {
        return None;
    }
    let sum = |f: fn(&AgentStats) -> u32| agents.iter().map(f).sum::<u32>();
    let kills = sum(|a| a.kills);
    let deaths = sum(|a| a.deaths);

    let kast: Vec<f64> = agents
        .iter()
        .filter_map(|a| a.kast.trim().trim_end_matches('%').trim().parse().ok())
        .collect();
    let kast = if kast.is_empty() {
        "0%".to_string()
    } else {
        format!("{}%", (kast.iter().sum::<f64>() / kast.len() as f64).round())
    };

    Some(AgentStats {
        agent: OVERALL.to_string(),
        rounds: sum(|a| a.rounds),
        rating: mean(agents.iter().map(|a| a.rating)),
        acs: mean(agents.iter().map(|a| a.acs)),
        kd: if deaths == 0 {
            0.0
        } else {
            round2(f64::from(kills) / f64::from(deaths))
        },
        adr: mean(agents.iter().map(|a| a.adr)),
        kast,
        kpr: mean(agents.iter().map(|a| a.kpr)),
        apr: mean(agents.iter().map(|a| a.apr)),
        fkpr: mean(agents.iter().map(|a| a.fkpr)),
        fdpr: mean(agents.iter().map(|a| a.fdpr)),
        kills,
        deaths,
        assists: sum(|a| a.assists),
        fk: sum(|a| a.fk),
        fd: sum(|a| a.fd),
    })
}

/// The table with its [`OVERALL`] row appended when it has any agent.
pub fn with_overall(mut agents: Vec<AgentStats>) -> Vec<AgentStats> {
    if let Some(total) = overall_row(&agents) {
        agents.push(total);
    }
    agents
}
