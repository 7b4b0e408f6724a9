//! Underdog Fantasy over/under lines.

use std::time::Duration;

use lw_schemas::{Slate, SlateEntry};
use serde_json::Value;
use tracing::debug;

use crate::{HttpFetcher, SlateSource, SourceError};

#[derive(Debug, Clone)]
pub struct UnderdogSlateSource {
    url: String,
    stat_suffix: String,
    http: HttpFetcher,
}

impl UnderdogSlateSource {
    pub fn new(
        url: impl Into<String>,
        stat_suffix: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            url: url.into(),
            stat_suffix: stat_suffix.into(),
            http: HttpFetcher::new(timeout, user_agent)?,
        })
    }
}

#[async_trait::async_trait]
impl SlateSource for UnderdogSlateSource {
    fn source_name(&self) -> &'static str {
        "underdog"
    }

    async fn fetch_slate(&self) -> Result<Slate, SourceError> {
        let body = self.http.get_json(&self.url).await?;
        let slate = parse_slate(&body, &self.stat_suffix);
        debug!(
            listed = slate.listed_lines,
            tracked = slate.entries.len(),
            "underdog slate fetched"
        );
        Ok(slate)
    }
}

/// Extract tracked-stat entries from an over/under response.
///
/// Accepts either a bare array of lines or an object carrying them under
/// `over_under_lines`. Anything else is an empty (inactive) slate. Lines
/// without a title, or for another statistic, are counted but skipped.
pub fn parse_slate(body: &Value, stat_suffix: &str) -> Slate {
    let lines = body
        .as_array()
        .or_else(|| body.get("over_under_lines").and_then(Value::as_array));

    let Some(lines) = lines else {
        return Slate::default();
    };

    let entries = lines
        .iter()
        .filter_map(|item| parse_line(item, stat_suffix))
        .collect();

    Slate {
        listed_lines: lines.len(),
        entries,
    }
}

fn parse_line(item: &Value, stat_suffix: &str) -> Option<SlateEntry> {
    let title = item.get("over_under")?.get("title")?.as_str()?;
    if !title.contains(stat_suffix) {
        return None;
    }
    let player = title.replace(stat_suffix, "").trim().to_string();
    if player.is_empty() {
        return None;
    }

    let options = item.get("options").and_then(Value::as_array);
    let odds = |i: usize| {
        options
            .and_then(|o| o.get(i))
            .and_then(|o| o.get("american_price"))
            .and_then(value_as_string)
            .unwrap_or_else(|| "N/A".to_string())
    };

    Some(SlateEntry {
        player,
        team: None,
        line: item.get("stat_value").and_then(value_as_f64),
        odds_over: odds(0),
        odds_under: odds(1),
    })
}

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
