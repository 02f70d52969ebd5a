use thiserror::Error;

use crate::upstream::UpstreamKind;

/// Failure reported by a [`Transport`](crate::transport::Transport) before any
/// HTTP status was received.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport failure: {0}")]
    Failed(String),
}

/// Everything that can go wrong while fetching from one upstream.
///
/// These never leave a fetcher: they are reported to the observer and
/// replaced by the upstream's fallback value.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build upstream URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("upstream responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream returned an empty body")]
    EmptyBody,

    #[error("failed to parse upstream JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("upstream returned no {0}")]
    EmptyResult(&'static str),
}

impl FetchError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::Transport(_) => "transport",
            FetchError::Status { .. } => "status",
            FetchError::EmptyBody => "empty_body",
            FetchError::Parse(_) => "parse",
            FetchError::EmptyResult(_) => "empty_result",
        }
    }
}

/// Startup-time configuration problems. A fetcher cannot be built while any
/// of these is present.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No base URL configured for upstream '{0}'.\n\
         Hint: run `aggregator configure {0}` or set AGGREGATOR_<UPSTREAM>_BASE_URL."
    )]
    MissingBaseUrl(UpstreamKind),

    #[error(
        "No API key configured for upstream '{0}'.\n\
         Hint: run `aggregator configure {0}` or set AGGREGATOR_<UPSTREAM>_API_KEY."
    )]
    MissingCredential(UpstreamKind),

    #[error("Base URL '{url}' for upstream '{kind}' is not a valid absolute URL")]
    InvalidBaseUrl { kind: UpstreamKind, url: String },
}

/// Request-level failure of the aggregator. Only raised for defects inside
/// fetch logic, never for upstream outages.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("{upstream} fetch failed unexpectedly: {message}")]
    Defect {
        upstream: UpstreamKind,
        message: String,
    },
}
