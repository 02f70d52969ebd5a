use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::upstream::UpstreamKind;

/// Connection settings for a single upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Overrides the upstream's default cache TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Interval of the background sweep that drops expired cache entries.
    pub cache_sweep_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cache_sweep_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    /// Example TOML:
    /// [upstreams.weather]
    /// base_url = "https://api.openweathermap.org/data/2.5"
    /// api_key = "..."
    #[serde(default)]
    pub upstreams: HashMap<String, UpstreamConfig>,
}

impl Config {
    /// Load config from `path`, or return an empty default if it doesn't
    /// exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "api-aggregator", "aggregator")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn upstream_config(&self, kind: UpstreamKind) -> Option<&UpstreamConfig> {
        self.upstreams.get(kind.as_str())
    }

    /// Set/replace the base URL and credential of an upstream, keeping any
    /// TTL override already present.
    pub fn upsert_upstream(&mut self, kind: UpstreamKind, base_url: String, api_key: String) {
        let entry = self.upstreams.entry(kind.as_str().to_string()).or_default();
        entry.base_url = base_url;
        entry.api_key = api_key;
    }

    pub fn is_upstream_configured(&self, kind: UpstreamKind) -> bool {
        self.upstream_config(kind)
            .is_some_and(|cfg| !cfg.base_url.trim().is_empty() && !cfg.api_key.trim().is_empty())
    }

    /// Apply `AGGREGATOR_<UPSTREAM>_BASE_URL` / `AGGREGATOR_<UPSTREAM>_API_KEY`
    /// from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for kind in UpstreamKind::all() {
            let prefix = kind.env_prefix();
            let base_url = lookup(&format!("AGGREGATOR_{prefix}_BASE_URL"));
            let api_key = lookup(&format!("AGGREGATOR_{prefix}_API_KEY"));

            if base_url.is_none() && api_key.is_none() {
                continue;
            }

            let entry = self.upstreams.entry(kind.as_str().to_string()).or_default();
            if let Some(url) = base_url {
                entry.base_url = url;
            }
            if let Some(key) = api_key {
                entry.api_key = key;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamKind;

    #[test]
    fn default_config_has_no_upstreams() {
        let cfg = Config::default();

        assert!(cfg.upstreams.is_empty());
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.transport.timeout(), Duration::from_secs(10));
        assert!(!cfg.is_upstream_configured(UpstreamKind::Weather));
    }

    #[test]
    fn upsert_sets_credentials_for_upstream() {
        let mut cfg = Config::default();

        cfg.upsert_upstream(
            UpstreamKind::News,
            "https://newsapi.org/v2".into(),
            "NEWS_KEY".into(),
        );

        let entry = cfg.upstream_config(UpstreamKind::News).expect("news must exist");
        assert_eq!(entry.api_key, "NEWS_KEY");
        assert!(cfg.is_upstream_configured(UpstreamKind::News));
        assert!(!cfg.is_upstream_configured(UpstreamKind::GitHub));
    }

    #[test]
    fn blank_credentials_do_not_count_as_configured() {
        let mut cfg = Config::default();
        cfg.upsert_upstream(UpstreamKind::Weather, "https://api.example".into(), "   ".into());

        assert!(!cfg.is_upstream_configured(UpstreamKind::Weather));
    }

    #[test]
    fn upsert_keeps_existing_ttl_override() {
        let mut cfg = Config::default();
        cfg.upstreams.insert(
            "github".into(),
            UpstreamConfig {
                cache_ttl_secs: Some(42),
                ..Default::default()
            },
        );

        cfg.upsert_upstream(UpstreamKind::GitHub, "https://api.github.com".into(), "T".into());

        let entry = cfg.upstream_config(UpstreamKind::GitHub).unwrap();
        assert_eq!(entry.cache_ttl_secs, Some(42));
        assert_eq!(entry.api_key, "T");
    }

    #[test]
    fn overrides_fill_and_replace_values() {
        let mut cfg = Config::default();
        cfg.upsert_upstream(UpstreamKind::Weather, "https://file.example".into(), "FILE".into());

        let env: HashMap<String, String> = [
            ("AGGREGATOR_WEATHER_API_KEY", "ENV_KEY"),
            ("AGGREGATOR_GITHUB_BASE_URL", "https://api.github.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        cfg.apply_overrides(|name| env.get(name).cloned());

        let weather = cfg.upstream_config(UpstreamKind::Weather).unwrap();
        assert_eq!(weather.base_url, "https://file.example");
        assert_eq!(weather.api_key, "ENV_KEY");

        let github = cfg.upstream_config(UpstreamKind::GitHub).unwrap();
        assert_eq!(github.base_url, "https://api.github.com");
        assert!(!cfg.is_upstream_configured(UpstreamKind::GitHub));
        assert!(cfg.upstream_config(UpstreamKind::News).is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            cache_sweep_secs = 60

            [upstreams.weather]
            base_url = "https://api.openweathermap.org/data/2.5"
            api_key = "KEY"
            cache_ttl_secs = 120
        "#;

        let cfg: Config = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.transport.timeout_secs, 10);
        assert_eq!(
            cfg.upstream_config(UpstreamKind::Weather).unwrap().cache_ttl_secs,
            Some(120)
        );
    }

    #[test]
    fn save_then_load_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_upstream(UpstreamKind::GitHub, "https://api.github.com".into(), "TOKEN".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_from_missing_path_is_empty_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
