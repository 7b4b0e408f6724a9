//! lw-daemon entry point.
//!
//! Loads configuration, builds the source adapters and the engine, wires
//! middleware, and starts the HTTP server. Route handlers live in
//! `routes.rs`; shared state lives in `state.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use lw_config::{apply_env_overrides, load_layered_yaml, ServerSettings, Settings};
use lw_daemon::{routes, state};
use lw_jobs::{spawn_sweeper, JobTracker};
use lw_reconcile::{Engine, EngineConfig};
use lw_sources::{UnderdogSlateSource, VlrClient};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

/// Comma-separated YAML layers, base first. Command-line paths win.
const ENV_CONFIG_PATHS: &str = "LW_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths();
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = apply_env_overrides(load_layered_yaml(&path_refs)?)?;
    info!(layers = paths.len(), config_hash = %loaded.config_hash, "config loaded");
    let settings = loaded.settings;

    let engine = build_engine(&settings)?;
    let tracker = JobTracker::new(settings.jobs.detail_capacity);
    spawn_sweeper(
        tracker.clone(),
        settings.jobs.sweep_interval(),
        settings.jobs.retention(),
    );

    let shared = Arc::new(state::AppState::new(engine, tracker));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors(&settings.server));

    let addr = settings.server.socket_addr()?;
    info!("lw-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn config_paths() -> Vec<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return args;
    }
    std::env::var(ENV_CONFIG_PATHS)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn build_engine(settings: &Settings) -> anyhow::Result<Engine> {
    let src = &settings.sources;
    let slate = UnderdogSlateSource::new(
        src.slate_url.clone(),
        settings.engine.stat_title_suffix.clone(),
        src.slate_timeout(),
        &src.user_agent,
    )
    .context("failed to build slate client")?;
    let stats = VlrClient::new(&src.stats_base_url, src.fetch_timeout(), &src.user_agent)
        .context("failed to build stats client")?;

    let config = EngineConfig {
        max_matches: settings.engine.max_matches,
        fetch_concurrency: settings.engine.fetch_concurrency,
        max_discovered_matches: settings.engine.max_discovered_matches,
    };
    Ok(Engine::new(Arc::new(slate), Arc::new(stats), config))
}

/// No configured origins means any origin may call the API.
fn cors(server: &ServerSettings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);

    if server.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    layer.allow_origin(origins)
}
