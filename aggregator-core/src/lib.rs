//! Core library for the API aggregator.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream fetchers (weather, news, repository listings) and the
//!   fetch-cache-fallback pipeline they share
//! - The process-wide response cache
//! - The parallel aggregator and its HTTP router
//!
//! It is used by `aggregator-cli`, but can also be embedded in other services.

pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod observe;
pub mod transport;
pub mod upstream;

pub use aggregator::Aggregator;
pub use api::{AppState, router};
pub use cache::ResponseCache;
pub use config::{Config, ServerConfig, TransportConfig, UpstreamConfig};
pub use error::{AggregateError, ConfigError, FetchError, TransportError};
pub use fetcher::Fetcher;
pub use model::{AggregateResult, NewsArticle, RepositoryEntry, WeatherSnapshot};
pub use observe::{FetchObserver, MetricsObserver};
pub use transport::{HttpTransport, Transport, UpstreamRequest, UpstreamResponse};
pub use upstream::{Upstream, UpstreamKind, UpstreamSettings};
