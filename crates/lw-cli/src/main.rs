use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lw_config::{apply_env_overrides, load_layered_yaml, LoadedConfig, Settings};
use lw_reconcile::{Engine, EngineConfig};
use lw_schemas::ComparisonPayload;
use lw_sources::{UnderdogSlateSource, VlrClient};

mod output;

use output::{render_comparison, render_report, StderrProgress};

#[derive(Parser)]
#[command(name = "lw")]
#[command(about = "linewatch: Underdog kill lines against VLR.gg history", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> overrides)
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Print JSON instead of a table
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stats for one player by name
    Player {
        /// Player name as shown on VLR.gg
        name: String,
    },

    /// Reconcile the current Underdog slate against VLR.gg
    Slate {
        /// Use this VLR.gg match page instead of discovering matches
        #[arg(long)]
        match_url: Option<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigDump {
        /// Paths in merge order
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigDump { paths } => {
            let loaded = load(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Player { name } => {
            let engine = build_engine(&load(&cli.config_paths)?.settings)?;
            eprintln!("[*] Looking up {name} on VLR.gg");
            let report = engine
                .player_report(name.trim())
                .await
                .with_context(|| format!("player '{name}'"))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_report(&report));
            }
        }

        Commands::Slate { match_url } => {
            let engine = build_engine(&load(&cli.config_paths)?.settings)?;
            let mut progress = StderrProgress::default();
            let payload = engine
                .run_slate(&mut progress, match_url.as_deref())
                .await
                .context("slate run failed")?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                match &payload {
                    ComparisonPayload::Comparison(cmp) => print!("{}", render_comparison(cmp)),
                    ComparisonPayload::NoActiveSlate { message } => println!("{message}"),
                }
            }
        }
    }

    Ok(())
}

/// Logs go to stderr; default level is `warn` so tables stay readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

fn load(paths: &[String]) -> Result<LoadedConfig> {
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    apply_env_overrides(load_layered_yaml(&refs)?)
}

fn build_engine(settings: &Settings) -> Result<Engine> {
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
    tracing::debug!(?config, "engine configured");
    Ok(Engine::new(Arc::new(slate), Arc::new(stats), config))
}
