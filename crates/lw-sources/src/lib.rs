//! lw-sources
//!
//! Provider boundary for the two external data sources:
//! - the fantasy source (Underdog over/under lines) behind [`SlateSource`]
//! - the statistics site (VLR.gg player, team and match pages) behind [`StatsSource`]
//!
//! This crate owns HTTP transport and page parsing only. Matching, averaging
//! and grouping live in `lw-reconcile`; nothing here retries or caches.

pub mod http;
pub mod normalize;
pub mod underdog;
pub mod vlr;

pub use http::HttpFetcher;
pub use normalize::normalize_name;
pub use underdog::UnderdogSlateSource;
pub use vlr::VlrClient;

use lw_schemas::{AgentStats, Slate};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a source adapter may return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("request timed out: {url}")]
    Timeout { url: String },
    #[error("connection failed: {url}: {message}")]
    Connection { url: String, message: String },
    #[error("http status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl SourceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceError::Timeout { .. })
    }
}

// ---------------------------------------------------------------------------
// Stats-site payloads
// ---------------------------------------------------------------------------

/// One entry of a player search result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub display_name: String,
    pub url: String,
}

/// Fields read from a player profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePage {
    pub name: Option<String>,
    pub team: Option<String>,
    pub team_url: Option<String>,
}

/// One map row for a single player on a match page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRow {
    pub map: String,
    pub agent: String,
    pub kills: u32,
    pub match_url: String,
    pub match_title: String,
    pub match_date: String,
}

/// Player link found on a match page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPlayer {
    pub display_name: String,
    pub url: String,
    pub team: Option<String>,
}

/// Teams and player links of one match page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRoster {
    pub match_url: String,
    pub teams: Vec<String>,
    pub players: Vec<RosterPlayer>,
}

// ---------------------------------------------------------------------------
// Source traits
// ---------------------------------------------------------------------------

/// Fantasy-source contract: one fetch returns the whole current slate.
#[async_trait::async_trait]
pub trait SlateSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch_slate(&self) -> Result<Slate, SourceError>;
}

/// Statistics-site contract.
///
/// Each method is one page fetch. URLs are absolute.
#[async_trait::async_trait]
pub trait StatsSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn search_players(&self, query: &str) -> Result<Vec<SearchHit>, SourceError>;

    async fn fetch_profile(&self, profile_url: &str) -> Result<ProfilePage, SourceError>;

    /// Match URLs from the player's match history, most recent first.
    async fn fetch_match_links(&self, profile_url: &str) -> Result<Vec<String>, SourceError>;

    /// The player's per-map rows on one match page, in map order.
    async fn fetch_player_maps(
        &self,
        match_url: &str,
        player: &str,
    ) -> Result<Vec<MapRow>, SourceError>;

    /// URL of the team's next (or most likely upcoming) match.
    async fn fetch_next_match(&self, team_url: &str) -> Result<Option<String>, SourceError>;

    async fn fetch_match_roster(&self, match_url: &str) -> Result<MatchRoster, SourceError>;

    /// Per-agent stats table of a profile for one timespan
    /// (`30d`, `60d`, `90d` or `all`).
    async fn fetch_agent_stats(
        &self,
        profile_url: &str,
        timespan: &str,
    ) -> Result<Vec<AgentStats>, SourceError>;
}
