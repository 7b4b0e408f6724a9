//! VLR.gg statistics adapter.

pub mod parse;

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use lw_schemas::AgentStats;
use tracing::debug;

use crate::{HttpFetcher, MapRow, MatchRoster, ProfilePage, SearchHit, SourceError, StatsSource};

/// Team-page match links checked for a date when picking the next match.
const NEXT_MATCH_CANDIDATES: usize = 5;

#[derive(Debug, Clone)]
pub struct VlrClient {
    base_url: String,
    http: HttpFetcher,
}

impl VlrClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, SourceError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: HttpFetcher::new(timeout, user_agent)?,
        })
    }

    async fn page(&self, url: &str) -> Result<String, SourceError> {
        self.http.get_text(url, &[]).await
    }
}

/// Match history lives under `/player/matches/<id>/<slug>`.
pub fn history_url(profile_url: &str) -> String {
    profile_url.replacen("/player/", "/player/matches/", 1)
}

/// Choose the upcoming match from team-page links and their dates.
///
/// First link dated today or later wins; otherwise the first link whose
/// date could not be read; otherwise the first link overall.
pub fn pick_next_match(candidates: &[(String, Option<NaiveDate>)], today: NaiveDate) -> Option<String> {
    candidates
        .iter()
        .find(|(_, d)| d.is_some_and(|d| d >= today))
        .or_else(|| candidates.iter().find(|(_, d)| d.is_none()))
        .or_else(|| candidates.first())
        .map(|(url, _)| url.clone())
}

#[async_trait::async_trait]
impl StatsSource for VlrClient {
    fn source_name(&self) -> &'static str {
        "vlr"
    }

    async fn search_players(&self, query: &str) -> Result<Vec<SearchHit>, SourceError> {
        let url = format!("{}/search/", self.base_url);
        let html = self
            .http
            .get_text(&url, &[("q", query), ("type", "players")])
            .await?;
        let hits = parse::parse_search_results(&html, &self.base_url);
        debug!(query, hits = hits.len(), "vlr search");
        Ok(hits)
    }

    async fn fetch_profile(&self, profile_url: &str) -> Result<ProfilePage, SourceError> {
        let html = self.page(profile_url).await?;
        Ok(parse::parse_profile(&html, &self.base_url))
    }

    async fn fetch_match_links(&self, profile_url: &str) -> Result<Vec<String>, SourceError> {
        let html = self.page(&history_url(profile_url)).await?;
        Ok(parse::parse_match_links(&html, &self.base_url))
    }

    async fn fetch_player_maps(
        &self,
        match_url: &str,
        player: &str,
    ) -> Result<Vec<MapRow>, SourceError> {
        let html = self.page(match_url).await?;
        Ok(parse::parse_player_maps(&html, match_url, player))
    }

    async fn fetch_next_match(&self, team_url: &str) -> Result<Option<String>, SourceError> {
        let html = self.page(team_url).await?;
        let links = parse::parse_match_links(&html, &self.base_url);

        let mut candidates = Vec::new();
        for url in links.into_iter().take(NEXT_MATCH_CANDIDATES) {
            let date = match self.page(&url).await {
                Ok(page) => parse::parse_match_header(&page).parsed_date(),
                Err(e) => {
                    debug!(url = %url, error = %e, "match date lookup failed");
                    None
                }
            };
            candidates.push((url, date));
        }
        Ok(pick_next_match(&candidates, Utc::now().date_naive()))
    }

    async fn fetch_match_roster(&self, match_url: &str) -> Result<MatchRoster, SourceError> {
        let html = self.page(match_url).await?;
        Ok(parse::parse_match_roster(&html, match_url, &self.base_url))
    }

    async fn fetch_agent_stats(
        &self,
        profile_url: &str,
        timespan: &str,
    ) -> Result<Vec<AgentStats>, SourceError> {
        let html = self
            .http
            .get_text(profile_url, &[("timespan", timespan)])
            .await?;
        let rows = parse::parse_agent_table(&html);
        debug!(url = profile_url, timespan, agents = rows.len(), "vlr agent table");
        Ok(rows)
    }
}
