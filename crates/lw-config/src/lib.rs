//! lw-config
//!
//! Layered YAML configuration for the linewatch daemon and CLI.
//!
//! Documents are merged in order (earlier = base, later = override), then
//! environment overrides are applied, then the merged JSON is decoded into
//! typed [`Settings`]. Every key has a default, so an empty layer list is a
//! valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

pub const ENV_BIND_ADDR: &str = "LW_BIND_ADDR";
/// Comma-separated list of allowed CORS origins.
pub const ENV_ALLOWED_ORIGINS: &str = "LW_ALLOWED_ORIGINS";

// ---------------------------------------------------------------------------
// Typed settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub sources: SourceSettings,
    pub engine: EngineSettings,
    pub jobs: JobSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// Empty = any origin (development).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("invalid server.bind_addr: {}", self.bind_addr))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub slate_url: String,
    pub stats_base_url: String,
    pub slate_timeout_secs: u64,
    /// Per-request timeout for every stats-site fetch.
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            slate_url: "https://api.underdogfantasy.com/v1/over_under_lines?sport_id=val"
                .to_string(),
            stats_base_url: "https://www.vlr.gg".to_string(),
            slate_timeout_secs: 20,
            fetch_timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl SourceSettings {
    pub fn slate_timeout(&self) -> Duration {
        Duration::from_secs(self.slate_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Match pages inspected per player.
    pub max_matches: usize,
    /// Concurrent match-page fetches within one player.
    pub fetch_concurrency: usize,
    /// Upcoming matches considered when grouping the slate.
    pub max_discovered_matches: usize,
    /// Slate title suffix identifying the tracked statistic.
    pub stat_title_suffix: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_matches: 40,
            fetch_concurrency: 4,
            max_discovered_matches: 10,
            stat_title_suffix: " Kills on Maps 1+2 O/U".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Status detail lines retained per job.
    pub detail_capacity: usize,
    /// How long a finished job stays queryable.
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            detail_capacity: 20,
            retention_secs: 600,
            sweep_interval_secs: 60,
        }
    }
}

impl JobSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
    pub settings: Settings,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document decodes to null; treat it as "no overrides".
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }
    finish(merged)
}

/// Apply `LW_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(loaded: LoadedConfig) -> Result<LoadedConfig> {
    apply_overrides_from(loaded, |k| std::env::var(k).ok())
}

/// Same as [`apply_env_overrides`] with an injectable lookup (tests).
pub fn apply_overrides_from(
    loaded: LoadedConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<LoadedConfig> {
    let mut patch = serde_json::json!({});
    if let Some(addr) = lookup(ENV_BIND_ADDR) {
        patch = deep_merge(patch, serde_json::json!({ "server": { "bind_addr": addr.trim() } }));
    }
    if let Some(raw) = lookup(ENV_ALLOWED_ORIGINS) {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        patch = deep_merge(
            patch,
            serde_json::json!({ "server": { "allowed_origins": origins } }),
        );
    }
    finish(deep_merge(loaded.config_json, patch))
}

fn finish(merged: Value) -> Result<LoadedConfig> {
    let settings: Settings =
        serde_json::from_value(merged.clone()).context("config does not match settings schema")?;
    let canonical_json = canonicalize_json(&merged)?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
        settings,
    })
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, b_val) in b_map {
                let a_val = a_map.remove(&k).unwrap_or(Value::Null);
                a_map.insert(k, deep_merge(a_val, b_val));
            }
            Value::Object(a_map)
        }
        (_, b_other) => b_other,
    }
}

fn canonicalize_json(v: &Value) -> Result<String> {
    // serde_json's default map is ordered by key, so this is stable under
    // key reordering in the source YAML.
    serde_json::to_string(v).context("canonical json serialize failed")
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_layers_yield_defaults() {
        let loaded = load_layered_yaml_from_strings(&[]).unwrap();
        assert_eq!(loaded.settings, Settings::default());
        assert_eq!(loaded.settings.engine.max_matches, 40);
        assert_eq!(loaded.settings.sources.fetch_timeout_secs, 15);
    }

    #[test]
    fn empty_document_is_ignored() {
        let loaded = load_layered_yaml_from_strings(&["", "engine:\n  max_matches: 5\n"]).unwrap();
        assert_eq!(loaded.settings.engine.max_matches, 5);
    }

    #[test]
    fn deep_merge_overrides_leaves_only() {
        let merged = deep_merge(
            serde_json::json!({"a": {"x": 1, "y": 2}}),
            serde_json::json!({"a": {"y": 3}}),
        );
        assert_eq!(merged, serde_json::json!({"a": {"x": 1, "y": 3}}));
    }

    #[test]
    fn bad_bind_addr_is_reported() {
        let s = ServerSettings {
            bind_addr: "not-an-addr".into(),
            allowed_origins: vec![],
        };
        let err = s.socket_addr().unwrap_err();
        assert!(err.to_string().contains("server.bind_addr"));
    }
}
