//! Name and team matching between the fantasy source and the stats site.

use lw_sources::normalize::{names_overlap, normalize_name};
use lw_sources::{RosterPlayer, SearchHit, SourceError, StatsSource};
use thiserror::Error;
use tracing::{debug, warn};

/// Which of a match's two teams a player belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    One,
    Two,
}

/// Side used when a team label matches neither team of a match.
///
/// Keeps unresolvable players visible inside their match instead of
/// dropping them. Every use is logged at `warn`.
pub const DEFAULT_SIDE: Side = Side::One;

/// Why a player's stats could not be produced. `Display` is the user-facing
/// row message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Player not found on VLR.gg")]
    PlayerNotFound,
    #[error("{}", fetch_failure_message(.0))]
    ProfileFetchFailed(SourceError),
    #[error("No match history found")]
    NoMatchHistory,
    #[error("No valid matches found (need matches with exactly 2 maps)")]
    NoValidMatches,
}

fn fetch_failure_message(err: &SourceError) -> String {
    match err {
        SourceError::Timeout { .. } => "Request timeout - VLR.gg may be slow or unavailable".into(),
        SourceError::Connection { .. } => "Connection error - cannot reach VLR.gg".into(),
        SourceError::Status { status: 404, .. } => "Player page not found on VLR.gg".into(),
        SourceError::Status { .. } => "Failed to fetch player page".into(),
        other => {
            let msg = other.to_string();
            format!("Scraping error: {}", msg.chars().take(100).collect::<String>())
        }
    }
}

/// Strip a trailing disambiguating counter such as `" (2)"`.
pub fn clean_team_name(team: &str) -> &str {
    let trimmed = team.trim_end();
    if let Some(open) = trimmed.rfind(" (") {
        let inner = &trimmed[open + 2..];
        if let Some(digits) = inner.strip_suffix(')') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return &trimmed[..open];
            }
        }
    }
    trimmed
}

fn team_matches(team: &str, label: &str) -> bool {
    names_overlap(clean_team_name(team), clean_team_name(label))
}

/// Side whose label matches `team`, if any. Side one is checked first.
pub fn side_of(team: &str, team1: &str, team2: &str) -> Option<Side> {
    if team_matches(team, team1) {
        Some(Side::One)
    } else if team_matches(team, team2) {
        Some(Side::Two)
    } else {
        None
    }
}

/// Assign a player's team to one side of a match, falling back to
/// [`DEFAULT_SIDE`].
pub fn assign_side(team: Option<&str>, team1: &str, team2: &str) -> Side {
    if let Some(side) = team.and_then(|t| side_of(t, team1, team2)) {
        return side;
    }
    warn!(
        team = team.unwrap_or("<none>"),
        team1, team2, "team matches neither side; using default side"
    );
    DEFAULT_SIDE
}

/// First hit whose normalised name contains the query, else the first hit.
pub fn pick_search_hit<'a>(query: &str, hits: &'a [SearchHit]) -> Option<&'a SearchHit> {
    let target = normalize_name(query);
    hits.iter()
        .find(|h| !target.is_empty() && normalize_name(&h.display_name).contains(&target))
        .or_else(|| hits.first())
}

/// Roster entry for a slate player: exact normalised name, then containment.
pub fn find_in_roster<'a>(player: &str, roster: &'a [RosterPlayer]) -> Option<&'a RosterPlayer> {
    let target = normalize_name(player);
    if target.is_empty() {
        return None;
    }
    roster
        .iter()
        .find(|p| normalize_name(&p.display_name) == target)
        .or_else(|| roster.iter().find(|p| names_overlap(&p.display_name, player)))
}

/// Profile URL for `name` via the stats site's search.
pub async fn resolve_profile(stats: &dyn StatsSource, name: &str) -> Result<String, ResolveError> {
    let hits = stats
        .search_players(name)
        .await
        .map_err(ResolveError::ProfileFetchFailed)?;
    let hit = pick_search_hit(name, &hits).ok_or(ResolveError::PlayerNotFound)?;
    debug!(player = name, url = %hit.url, "profile resolved");
    Ok(hit.url.clone())
}
