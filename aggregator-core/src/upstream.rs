use crate::{
    Config,
    error::{ConfigError, FetchError},
    transport::UpstreamRequest,
};
use reqwest::Url;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod github;
pub mod news;
pub mod weather;

pub use github::GitHubRepos;
pub use news::NewsApi;
pub use weather::OpenWeather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamKind {
    Weather,
    News,
    GitHub,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamKind::Weather => "weather",
            UpstreamKind::News => "news",
            UpstreamKind::GitHub => "github",
        }
    }

    pub const fn all() -> &'static [UpstreamKind] {
        &[UpstreamKind::Weather, UpstreamKind::News, UpstreamKind::GitHub]
    }

    /// Namespace prepended to every cache key of this upstream.
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            UpstreamKind::Weather => "Weather",
            UpstreamKind::News => "News",
            UpstreamKind::GitHub => "GitHubRepos",
        }
    }

    pub fn default_ttl(&self) -> Duration {
        match self {
            UpstreamKind::Weather => Duration::from_secs(30 * 60),
            UpstreamKind::News => Duration::from_secs(10 * 60),
            UpstreamKind::GitHub => Duration::from_secs(60 * 60),
        }
    }

    /// Suggested base URL offered by `aggregator configure`.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            UpstreamKind::Weather => "https://api.openweathermap.org/data/2.5",
            UpstreamKind::News => "https://newsapi.org/v2",
            UpstreamKind::GitHub => "https://api.github.com",
        }
    }

    /// Upper-case infix of the environment overrides, e.g. `AGGREGATOR_NEWS_API_KEY`.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            UpstreamKind::Weather => "WEATHER",
            UpstreamKind::News => "NEWS",
            UpstreamKind::GitHub => "GITHUB",
        }
    }
}

impl std::fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UpstreamKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "weather" | "openweather" => Ok(UpstreamKind::Weather),
            "news" | "newsapi" => Ok(UpstreamKind::News),
            "github" | "repos" => Ok(UpstreamKind::GitHub),
            _ => Err(anyhow::anyhow!(
                "Unknown upstream '{value}'. Supported upstreams: weather, news, github."
            )),
        }
    }
}

/// Resolved, validated connection settings of one upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    pub kind: UpstreamKind,
    pub base_url: String,
    pub api_key: String,
    pub cache_ttl: Duration,
}

impl UpstreamSettings {
    pub fn new(
        kind: UpstreamKind,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into().trim().to_string();
        let api_key = api_key.into().trim().to_string();

        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl(kind));
        }
        if api_key.is_empty() {
            return Err(ConfigError::MissingCredential(kind));
        }

        let valid = Url::parse(&base_url).is_ok_and(|u| !u.cannot_be_a_base());
        if !valid {
            return Err(ConfigError::InvalidBaseUrl { kind, url: base_url });
        }

        Ok(Self {
            kind,
            base_url,
            api_key,
            cache_ttl: kind.default_ttl(),
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Resolve settings for `kind` from config, applying any TTL override.
    pub fn from_config(kind: UpstreamKind, config: &Config) -> Result<Self, ConfigError> {
        let entry = config
            .upstream_config(kind)
            .ok_or(ConfigError::MissingBaseUrl(kind))?;

        let settings = Self::new(kind, entry.base_url.as_str(), entry.api_key.as_str())?;

        Ok(match entry.cache_ttl_secs {
            Some(secs) => settings.with_cache_ttl(Duration::from_secs(secs)),
            None => settings,
        })
    }
}

/// One upstream API: how to ask it and how to read its answer.
///
/// The fetch/cache/fallback pipeline around it lives in
/// [`Fetcher`](crate::fetcher::Fetcher).
pub trait Upstream: Send + Sync + Debug {
    type Output: Clone + Send + Sync + 'static;

    fn settings(&self) -> &UpstreamSettings;

    fn kind(&self) -> UpstreamKind {
        self.settings().kind
    }

    fn ttl(&self) -> Duration {
        self.settings().cache_ttl
    }

    /// Trim, substitute the default for blank input, and case-fold where the
    /// upstream treats the parameter case-insensitively.
    fn normalize(&self, param: &str) -> String;

    fn request(&self, normalized: &str) -> Result<UpstreamRequest, FetchError>;

    /// Parse a 200 body. Structurally empty results are errors.
    fn parse(&self, body: &str) -> Result<Self::Output, FetchError>;

    /// Static placeholder served when the upstream cannot be used.
    fn fallback(&self) -> Self::Output;
}

pub(crate) fn normalize_param(param: &str, default: &str, lowercase: bool) -> String {
    let trimmed = param.trim();
    let value = if trimmed.is_empty() { default } else { trimmed };

    if lowercase { value.to_lowercase() } else { value.to_string() }
}

/// Join `segments` onto `base` and append `query`, percent-encoding both.
pub(crate) fn endpoint(
    base: &str,
    segments: &[&str],
    query: &[(&str, &str)],
) -> Result<Url, FetchError> {
    let mut url = Url::parse(base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;

    url.path_segments_mut()
        .map_err(|_| FetchError::InvalidUrl(format!("{base}: cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Ok(url)
}
