use std::path::PathBuf;
use std::sync::Arc;

use aggregator_core::{
    Aggregator, Config, HttpTransport, MetricsObserver, ResponseCache, Upstream, UpstreamKind,
    UpstreamSettings,
    upstream::{github::DEFAULT_OWNER, news::DEFAULT_KEYWORD, weather::DEFAULT_CITY},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use tracing::info;

use crate::{
    metrics::Metrics,
    server::{self, ServeOptions},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "aggregator",
    version,
    about = "Weather, news and repository listings behind one endpoint"
)]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the aggregate API over HTTP.
    Serve {
        /// Host to bind to; defaults to `server.host` from config.
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on; defaults to `server.port` from config.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configure base URL and credentials for an upstream.
    Configure {
        /// Upstream short name: "weather", "news" or "github".
        upstream: String,
    },

    /// Run one aggregate call and print the JSON result.
    Show {
        #[arg(long, default_value = DEFAULT_CITY)]
        city: String,

        #[arg(long, default_value = DEFAULT_KEYWORD)]
        keyword: String,

        #[arg(long, default_value = DEFAULT_OWNER)]
        owner: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let path = match &self.config {
            Some(p) => p.clone(),
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Serve { host, port } => {
                let config = load_effective(&path)?;
                let metrics = Metrics::init()?;
                let (aggregator, cache) = build_aggregator(&config)?;

                let opts = ServeOptions {
                    host: host.unwrap_or_else(|| config.server.host.clone()),
                    port: port.unwrap_or(config.server.port),
                    cache_sweep: std::time::Duration::from_secs(config.server.cache_sweep_secs),
                };
                server::run(aggregator, cache, metrics, opts).await
            }
            Command::Configure { upstream } => {
                let kind = UpstreamKind::try_from(upstream.as_str())?;
                configure(kind, &path)
            }
            Command::Show {
                city,
                keyword,
                owner,
            } => {
                let config = load_effective(&path)?;
                let (aggregator, _cache) = build_aggregator(&config)?;

                let result = aggregator.aggregate(&city, &keyword, &owner).await?;
                let json = serde_json::to_string_pretty(&result)
                    .context("Failed to serialize aggregate result")?;
                println!("{json}");
                Ok(())
            }
        }
    }
}

/// Config file plus environment overrides.
fn load_effective(path: &std::path::Path) -> Result<Config> {
    let mut config = Config::load_from(path)?;
    config.apply_env_overrides();
    Ok(config)
}

fn build_aggregator(config: &Config) -> Result<(Aggregator, Arc<ResponseCache>)> {
    let transport = HttpTransport::new(config.transport.timeout())
        .context("Failed to build HTTP client")?;
    let cache = Arc::new(ResponseCache::new());
    let observer = MetricsObserver::new();

    let aggregator = Aggregator::from_config(
        config,
        Arc::new(transport),
        Arc::clone(&cache),
        Arc::new(observer),
    )?;

    for settings in [
        aggregator.weather().upstream().settings(),
        aggregator.news().upstream().settings(),
        aggregator.repos().upstream().settings(),
    ] {
        info!(
            upstream = %settings.kind,
            base_url = %settings.base_url,
            cache_ttl_secs = settings.cache_ttl.as_secs(),
            "upstream configured"
        );
    }

    Ok((aggregator, cache))
}

fn configure(kind: UpstreamKind, path: &std::path::Path) -> Result<()> {
    // File values only; env overrides must not end up on disk.
    let mut config = Config::load_from(path)?;
    let current = config.upstream_config(kind).cloned().unwrap_or_default();

    if config.is_upstream_configured(kind) {
        println!("{kind} is already configured in {}", path.display());
    }

    let default_url = if current.base_url.is_empty() {
        kind.default_base_url().to_string()
    } else {
        current.base_url.clone()
    };

    let base_url = Text::new(&format!("Base URL for {kind}:"))
        .with_default(&default_url)
        .prompt()?;

    let key_message = format!("API key for {kind}:");
    let mut prompt = Password::new(&key_message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if !current.api_key.is_empty() {
        prompt = prompt.with_help_message("Leave empty to keep the current key");
    }
    let entered = prompt.prompt()?;

    let api_key = if entered.trim().is_empty() {
        current.api_key
    } else {
        entered
    };

    // Same validation the server applies at startup.
    UpstreamSettings::new(kind, base_url.as_str(), api_key.as_str())?;

    config.upsert_upstream(kind, base_url.trim().to_string(), api_key.trim().to_string());
    config.save_to(path)?;

    println!("Saved {kind} settings to {}", path.display());
    Ok(())
}
