//! lw-schemas
//!
//! Shared data model for slate reconciliation: slate entries from the
//! fantasy source, player profiles and match history from the stats source,
//! and the comparison payload served to clients.
//!
//! Plain data only. No IO, no parsing of provider payloads.

pub mod progress;

pub use progress::{NullProgress, Progress};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Message returned in place of a comparison when the fantasy source has no
/// posted lines.
pub const NO_SLATE_MESSAGE: &str =
    "No players found on Underdog. Please check Underdog website for more details.";

// ---------------------------------------------------------------------------
// Fantasy source
// ---------------------------------------------------------------------------

/// One posted line from the fantasy source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlateEntry {
    pub player: String,
    /// Team label when the slate carries one. May include a disambiguating
    /// suffix such as `" (2)"`.
    pub team: Option<String>,
    /// Posted statistical threshold (kills on maps 1+2).
    pub line: Option<f64>,
    pub odds_over: String,
    pub odds_under: String,
}

impl SlateEntry {
    pub fn new(player: impl Into<String>, line: Option<f64>) -> Self {
        Self {
            player: player.into(),
            team: None,
            line,
            odds_over: "N/A".to_string(),
            odds_under: "N/A".to_string(),
        }
    }
}

/// Everything the fantasy source returned for one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slate {
    /// Number of raw lines the source listed, of any stat type.
    pub listed_lines: usize,
    /// Lines for the tracked statistic, in slate order.
    pub entries: Vec<SlateEntry>,
}

impl Slate {
    /// The source reported nothing at all.
    pub fn is_inactive(&self) -> bool {
        self.listed_lines == 0
    }
}

// ---------------------------------------------------------------------------
// Stats source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapKills {
    pub map: String,
    pub agent: String,
    pub kills: u32,
}

/// One historical match for a player, restricted to the counted maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "match")]
    pub title: String,
    pub date: String,
    pub match_url: String,
    pub total_kills: u32,
    pub map_kills: Vec<MapKills>,
}

impl MatchRecord {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        match_url: impl Into<String>,
        map_kills: Vec<MapKills>,
    ) -> Self {
        let total_kills = map_kills.iter().map(|m| m.kills).sum();
        Self {
            title: title.into(),
            date: date.into(),
            match_url: match_url.into(),
            total_kills,
            map_kills,
        }
    }
}

/// Resolved identity of a player on the stats source.
///
/// `matches` is ordered most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub team: Option<String>,
    pub profile_url: String,
    pub team_url: Option<String>,
    pub matches: Vec<MatchRecord>,
}

// ---------------------------------------------------------------------------
// Comparison output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub last_5: Option<f64>,
    pub last_10: Option<f64>,
    pub last_25: Option<f64>,
}

/// One reconciled slate entry. Either carries averages or an error reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub player: String,
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlr_url: Option<String>,
    pub line: Option<f64>,
    pub odds_over: String,
    pub odds_under: String,
    pub avg_last_5: Option<f64>,
    pub avg_last_10: Option<f64>,
    pub avg_last_25: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches_analyzed: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonRow {
    /// Row for a player whose stats were resolved.
    pub fn resolved(entry: &SlateEntry, profile: &PlayerProfile, averages: Averages) -> Self {
        Self {
            player: entry.player.clone(),
            team: profile.team.clone().or_else(|| entry.team.clone()),
            team_url: profile.team_url.clone(),
            vlr_url: Some(profile.profile_url.clone()),
            line: entry.line,
            odds_over: entry.odds_over.clone(),
            odds_under: entry.odds_under.clone(),
            avg_last_5: averages.last_5,
            avg_last_10: averages.last_10,
            avg_last_25: averages.last_25,
            matches_analyzed: Some(profile.matches.len()),
            error: None,
        }
    }

    /// Row for a player that could not be resolved. Numeric fields stay empty.
    pub fn failed(entry: &SlateEntry, reason: impl Into<String>) -> Self {
        Self {
            player: entry.player.clone(),
            team: entry.team.clone(),
            team_url: None,
            vlr_url: None,
            line: entry.line,
            odds_over: entry.odds_over.clone(),
            odds_under: entry.odds_under.clone(),
            avg_last_5: None,
            avg_last_10: None,
            avg_last_25: None,
            matches_analyzed: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Players of one match (or one fallback bucket).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchGroup {
    #[serde(skip)]
    pub key: String,
    pub teams: Vec<String>,
    pub players: Vec<ComparisonRow>,
}

/// Ordered collection of groups, serialized as a JSON object keyed by
/// `MatchGroup::key` in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchGroups(pub Vec<MatchGroup>);

impl MatchGroups {
    pub fn get(&self, key: &str) -> Option<&MatchGroup> {
        self.0.iter().find(|g| g.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|g| g.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MatchGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in &self.0 {
            map.serialize_entry(&group.key, group)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlateComparison {
    /// All rows in slate order.
    pub players: Vec<ComparisonRow>,
    pub players_by_match: MatchGroups,
    /// Teams of the first discovered match, empty when none was found.
    pub match_teams: Vec<String>,
    /// Echo of a caller-supplied match override, when it was used.
    pub match_url: Option<String>,
}

impl SlateComparison {
    pub fn row_count(&self) -> usize {
        self.players.len()
    }
}

/// Result of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComparisonPayload {
    Comparison(SlateComparison),
    NoActiveSlate { message: String },
}

impl ComparisonPayload {
    pub fn no_active_slate() -> Self {
        ComparisonPayload::NoActiveSlate {
            message: NO_SLATE_MESSAGE.to_string(),
        }
    }

    pub fn comparison(&self) -> Option<&SlateComparison> {
        match self {
            ComparisonPayload::Comparison(c) => Some(c),
            ComparisonPayload::NoActiveSlate { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent stats
// ---------------------------------------------------------------------------

/// One row of a player's per-agent stats table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub agent: String,
    pub rounds: u32,
    pub rating: f64,
    pub acs: f64,
    pub kd: f64,
    pub adr: f64,
    /// Percentage as displayed, e.g. `"73%"`.
    pub kast: String,
    pub kpr: f64,
    pub apr: f64,
    pub fkpr: f64,
    pub fdpr: f64,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub fk: u32,
    pub fd: u32,
}

/// Agent table for one timespan (`30d`, `60d`, `90d`, `all`). When any
/// agent is listed the last row is the combined `Overall` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTimespan {
    pub timespan: String,
    pub agents: Vec<AgentStats>,
}

/// Response for a direct single-player query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub player: String,
    pub team: Option<String>,
    pub team_url: Option<String>,
    pub vlr_url: String,
    pub averages: Averages,
    pub matches: Vec<MatchRecord>,
    pub matches_found: usize,
    /// Timespans whose table could not be read are left out.
    #[serde(default)]
    pub agent_stats: Vec<AgentTimespan>,
    /// Set when the profile lists no match history at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(player: &str) -> ComparisonRow {
        ComparisonRow::failed(&SlateEntry::new(player, Some(30.5)), "nope")
    }

    #[test]
    fn match_record_totals_map_kills() {
        let rec = MatchRecord::new(
            "SEN vs NRG",
            "2025-03-01",
            "https://www.vlr.gg/1234/sen-vs-nrg",
            vec![
                MapKills {
                    map: "Ascent".into(),
                    agent: "Jett".into(),
                    kills: 18,
                },
                MapKills {
                    map: "Bind".into(),
                    agent: "Raze".into(),
                    kills: 21,
                },
            ],
        );
        assert_eq!(rec.total_kills, 39);

        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["match"], "SEN vs NRG");
        assert_eq!(v["total_kills"], 39);
    }

    #[test]
    fn failed_row_omits_optional_fields() {
        let v = serde_json::to_value(row("TenZ")).unwrap();
        assert_eq!(v["error"], "nope");
        assert!(v["avg_last_5"].is_null());
        assert!(v.get("vlr_url").is_none());
        assert!(v.get("matches_analyzed").is_none());
    }

    #[test]
    fn match_groups_serialize_in_insertion_order() {
        let groups = MatchGroups(vec![
            MatchGroup {
                key: "Zeta vs Alpha".into(),
                teams: vec!["Zeta".into(), "Alpha".into()],
                players: vec![row("a")],
            },
            MatchGroup {
                key: "Beta vs Gamma".into(),
                teams: vec!["Beta".into(), "Gamma".into()],
                players: vec![],
            },
        ]);
        let s = serde_json::to_string(&groups).unwrap();
        let zeta = s.find("Zeta vs Alpha").unwrap();
        let beta = s.find("Beta vs Gamma").unwrap();
        assert!(zeta < beta);
        assert!(!s.contains("\"key\""));
    }

    #[test]
    fn no_slate_payload_has_only_message() {
        let v = serde_json::to_value(ComparisonPayload::no_active_slate()).unwrap();
        assert_eq!(v["message"], NO_SLATE_MESSAGE);
        assert!(v.get("players").is_none());
    }
}
