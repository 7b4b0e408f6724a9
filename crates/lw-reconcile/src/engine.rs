//! Reconciliation engine.
//!
//! One run fetches the slate, discovers the upcoming matches its players
//! belong to, then resolves every slate entry against the stats site in
//! slate order. Each entry yields exactly one [`ComparisonRow`]; failures
//! are recorded on the row and never abort the run.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use lw_schemas::{
    AgentTimespan, ComparisonPayload, ComparisonRow, MatchRecord, PlayerProfile, PlayerReport,
    Progress, SlateComparison, SlateEntry,
};
use lw_sources::normalize::normalize_name;
use lw_sources::{MapRow, ProfilePage, RosterPlayer, SlateSource, SourceError, StatsSource};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agents::{with_overall, AGENT_TIMESPANS};
use crate::aggregate::{averages, build_records};
use crate::group::group_rows;
use crate::matcher::{find_in_roster, resolve_profile, ResolveError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// The slate itself could not be fetched; nothing was reconciled.
    #[error("slate source unavailable: {0}")]
    SourceUnavailable(SourceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Match pages inspected per player.
    pub max_matches: usize,
    /// Concurrent match-page fetches within one player.
    pub fetch_concurrency: usize,
    /// Upper bound on upcoming matches used for grouping.
    pub max_discovered_matches: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_matches: 40,
            fetch_concurrency: 4,
            max_discovered_matches: 10,
        }
    }
}

/// An upcoming match that involves at least one slate player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredMatch {
    pub url: String,
    pub teams: [String; 2],
}

/// What discovery learned about the slate's match structure.
#[derive(Debug, Default)]
struct Discovery {
    roster: Vec<RosterPlayer>,
    matches: Vec<DiscoveredMatch>,
    match_teams: Vec<String>,
    override_url: Option<String>,
}

/// Lookups made during one run, failures included, so a dead profile
/// costs one timeout per run. Dropped with the run.
#[derive(Debug, Default)]
struct RunCache {
    profile_urls: HashMap<String, Result<String, ResolveError>>,
    pages: HashMap<String, Result<ProfilePage, SourceError>>,
}

#[derive(Clone)]
pub struct Engine {
    slate: Arc<dyn SlateSource>,
    stats: Arc<dyn StatsSource>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        slate: Arc<dyn SlateSource>,
        stats: Arc<dyn StatsSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            slate,
            stats,
            config,
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Reconcile the current slate.
    ///
    /// `match_url` pins the run to one match page instead of discovering
    /// upcoming matches from team pages.
    pub async fn run_slate(
        &self,
        progress: &mut dyn Progress,
        match_url: Option<&str>,
    ) -> Result<ComparisonPayload, EngineError> {
        progress.log("Fetching slate");
        let slate = self
            .slate
            .fetch_slate()
            .await
            .map_err(EngineError::SourceUnavailable)?;

        if slate.is_inactive() {
            info!(source = self.slate.source_name(), "no active slate");
            return Ok(ComparisonPayload::no_active_slate());
        }

        info!(
            source = self.slate.source_name(),
            listed = slate.listed_lines,
            players = slate.entries.len(),
            "slate fetched"
        );
        progress.begin(slate.entries.len());

        let mut cache = RunCache::default();
        let discovery = self
            .discover(&slate.entries, match_url, &mut cache, progress)
            .await;

        let mut rows = Vec::with_capacity(slate.entries.len());
        for entry in &slate.entries {
            let row = self.reconcile_entry(entry, &discovery, &mut cache).await;
            match &row.error {
                None => progress.item_done(&format!("Fetched stats for {}", entry.player)),
                Some(reason) => {
                    progress.item_done(&format!("Failed to fetch stats for {}: {reason}", entry.player))
                }
            }
            rows.push(row);
        }

        let players_by_match = group_rows(&rows, &discovery.matches, &discovery.match_teams);
        info!(
            rows = rows.len(),
            failed = rows.iter().filter(|r| r.is_error()).count(),
            groups = players_by_match.len(),
            "slate reconciled"
        );

        Ok(ComparisonPayload::Comparison(SlateComparison {
            players: rows,
            players_by_match,
            match_teams: discovery.match_teams,
            match_url: discovery.override_url,
        }))
    }

    /// Stats for one player by name, outside any slate.
    ///
    /// A player with no usable history still gets a report with empty
    /// matches and absent averages; `error` is set when the history page
    /// lists no matches at all.
    pub async fn player_report(&self, name: &str) -> Result<PlayerReport, ResolveError> {
        let mut cache = RunCache::default();
        let (profile, links_found) = self.load_profile(name, None, &mut cache).await?;
        let agent_stats = self.agent_tables(&profile.profile_url).await;
        debug!(
            player = name,
            links_found,
            matches = profile.matches.len(),
            timespans = agent_stats.len(),
            "player report"
        );
        Ok(PlayerReport {
            player: name.to_string(),
            averages: averages(&profile.matches),
            matches_found: profile.matches.len(),
            team: profile.team,
            team_url: profile.team_url,
            vlr_url: profile.profile_url,
            matches: profile.matches,
            agent_stats,
            error: (links_found == 0).then(|| ResolveError::NoMatchHistory.to_string()),
        })
    }

    /// Agent tables for every timespan that could be read. Failures only
    /// drop that timespan.
    async fn agent_tables(&self, profile_url: &str) -> Vec<AgentTimespan> {
        let mut out = Vec::new();
        for timespan in AGENT_TIMESPANS {
            match self.stats.fetch_agent_stats(profile_url, timespan).await {
                Ok(agents) if !agents.is_empty() => out.push(AgentTimespan {
                    timespan: timespan.to_string(),
                    agents: with_overall(agents),
                }),
                Ok(_) => debug!(url = profile_url, timespan, "no agent table"),
                Err(e) => debug!(url = profile_url, timespan, error = %e, "agent table skipped"),
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Per-player
    // -----------------------------------------------------------------------

    async fn reconcile_entry(
        &self,
        entry: &SlateEntry,
        discovery: &Discovery,
        cache: &mut RunCache,
    ) -> ComparisonRow {
        let hint = find_in_roster(&entry.player, &discovery.roster);

        let result = match self.load_profile(&entry.player, hint, cache).await {
            Ok((_, 0)) => Err(ResolveError::NoMatchHistory),
            Ok((profile, _)) if profile.matches.is_empty() => Err(ResolveError::NoValidMatches),
            other => other,
        };

        match result {
            Ok((profile, _)) => {
                debug!(player = %entry.player, matches = profile.matches.len(), "player resolved");
                ComparisonRow::resolved(entry, &profile, averages(&profile.matches))
            }
            Err(e) => {
                warn!(player = %entry.player, error = %e, "player not reconciled");
                let mut row = ComparisonRow::failed(entry, e.to_string());
                if row.team.is_none() {
                    row.team = hint.and_then(|h| h.team.clone());
                }
                row
            }
        }
    }

    /// Resolve a player and collect their qualifying match records.
    /// Also returns how many match links the history page listed.
    async fn load_profile(
        &self,
        name: &str,
        hint: Option<&RosterPlayer>,
        cache: &mut RunCache,
    ) -> Result<(PlayerProfile, usize), ResolveError> {
        let url = match hint {
            Some(h) => h.url.clone(),
            None => self.lookup_url(name, cache).await?,
        };
        let page = self.profile_page(&url, cache).await?;
        let (links_found, matches) = self.match_history(&url, name).await?;

        let profile = PlayerProfile {
            name: page.name.unwrap_or_else(|| name.to_string()),
            team: hint.and_then(|h| h.team.clone()).or(page.team),
            profile_url: url,
            team_url: page.team_url,
            matches,
        };
        Ok((profile, links_found))
    }

    async fn lookup_url(&self, name: &str, cache: &mut RunCache) -> Result<String, ResolveError> {
        let key = normalize_name(name);
        if let Some(found) = cache.profile_urls.get(&key) {
            return found.clone();
        }
        let found = resolve_profile(self.stats.as_ref(), name).await;
        cache.profile_urls.insert(key, found.clone());
        found
    }

    async fn profile_page(&self, url: &str, cache: &mut RunCache) -> Result<ProfilePage, ResolveError> {
        if let Some(page) = cache.pages.get(url) {
            return page.clone().map_err(ResolveError::ProfileFetchFailed);
        }
        let page = self.stats.fetch_profile(url).await;
        if let Err(e) = &page {
            debug!(url, error = %e, "profile fetch failed; not retried this run");
        }
        cache.pages.insert(url.to_string(), page.clone());
        page.map_err(ResolveError::ProfileFetchFailed)
    }

    /// Match pages are fetched with bounded concurrency; results keep link
    /// order, so records stay most-recent-first. A failed match page is
    /// skipped.
    async fn match_history(
        &self,
        profile_url: &str,
        player: &str,
    ) -> Result<(usize, Vec<MatchRecord>), ResolveError> {
        let links = self
            .stats
            .fetch_match_links(profile_url)
            .await
            .map_err(ResolveError::ProfileFetchFailed)?;

        let fetches: Vec<_> = links
            .iter()
            .take(self.config.max_matches)
            .map(|link| self.stats.fetch_player_maps(link, player))
            .collect();
        let pages: Vec<Result<Vec<MapRow>, SourceError>> =
            stream::iter(fetches)
                .buffered(self.config.fetch_concurrency.max(1))
                .collect()
                .await;

        let mut rows = Vec::new();
        for (link, page) in links.iter().zip(pages) {
            match page {
                Ok(maps) => rows.extend(maps),
                Err(e) => debug!(player, url = %link, error = %e, "match page skipped"),
            }
        }
        Ok((links.len(), build_records(&rows)))
    }

    // -----------------------------------------------------------------------
    // Match discovery
    // -----------------------------------------------------------------------

    async fn discover(
        &self,
        entries: &[SlateEntry],
        match_url: Option<&str>,
        cache: &mut RunCache,
        progress: &mut dyn Progress,
    ) -> Discovery {
        if let Some(url) = match_url {
            progress.log(&format!("Reading match {url}"));
            match self.stats.fetch_match_roster(url).await {
                Ok(roster) => {
                    return Discovery {
                        roster: roster.players,
                        matches: Vec::new(),
                        match_teams: roster.teams.into_iter().take(2).collect(),
                        override_url: Some(url.to_string()),
                    };
                }
                Err(e) => warn!(url, error = %e, "match override unreadable; discovering matches"),
            }
        }

        progress.log("Looking up player teams");
        let mut team_urls: Vec<String> = Vec::new();
        for entry in entries {
            let page = match self.lookup_url(&entry.player, cache).await {
                Ok(url) => self.profile_page(&url, cache).await,
                Err(e) => Err(e),
            };
            match page {
                Ok(ProfilePage {
                    team: Some(_),
                    team_url: Some(team_url),
                    ..
                }) => {
                    if !team_urls.contains(&team_url) {
                        team_urls.push(team_url);
                    }
                }
                Ok(_) => debug!(player = %entry.player, "no current team"),
                Err(e) => debug!(player = %entry.player, error = %e, "team lookup failed"),
            }
        }

        progress.log(&format!("Finding next matches for {} teams", team_urls.len()));
        let mut match_urls: Vec<String> = Vec::new();
        for team_url in &team_urls {
            if match_urls.len() >= self.config.max_discovered_matches {
                break;
            }
            match self.stats.fetch_next_match(team_url).await {
                Ok(Some(url)) if !match_urls.contains(&url) => match_urls.push(url),
                Ok(_) => {}
                Err(e) => debug!(team_url = %team_url, error = %e, "next match lookup failed"),
            }
        }

        let mut discovery = Discovery::default();
        for url in match_urls {
            let roster = match self.stats.fetch_match_roster(&url).await {
                Ok(r) => r,
                Err(e) => {
                    debug!(url = %url, error = %e, "match roster unreadable");
                    continue;
                }
            };
            let relevant = entries
                .iter()
                .any(|e| find_in_roster(&e.player, &roster.players).is_some());
            if !relevant {
                continue;
            }

            for p in roster.players {
                let key = normalize_name(&p.display_name);
                if !discovery
                    .roster
                    .iter()
                    .any(|r| normalize_name(&r.display_name) == key)
                {
                    discovery.roster.push(p);
                }
            }
            let mut teams = roster.teams.into_iter();
            if let (Some(t1), Some(t2)) = (teams.next(), teams.next()) {
                if discovery.match_teams.is_empty() {
                    discovery.match_teams = vec![t1.clone(), t2.clone()];
                }
                discovery.matches.push(DiscoveredMatch {
                    url,
                    teams: [t1, t2],
                });
            }
        }

        info!(
            teams = team_urls.len(),
            matches = discovery.matches.len(),
            roster = discovery.roster.len(),
            "match discovery done"
        );
        discovery
    }
}
