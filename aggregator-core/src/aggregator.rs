use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::{
    Config,
    cache::ResponseCache,
    error::{AggregateError, ConfigError},
    fetcher::Fetcher,
    model::AggregateResult,
    observe::FetchObserver,
    transport::Transport,
    upstream::{GitHubRepos, NewsApi, OpenWeather, UpstreamKind, UpstreamSettings},
};

/// The three fetchers behind `/api/aggregate`.
#[derive(Debug)]
pub struct Aggregator {
    weather: Fetcher<OpenWeather>,
    news: Fetcher<NewsApi>,
    repos: Fetcher<GitHubRepos>,
}

impl Aggregator {
    pub fn new(
        weather: Fetcher<OpenWeather>,
        news: Fetcher<NewsApi>,
        repos: Fetcher<GitHubRepos>,
    ) -> Self {
        Self {
            weather,
            news,
            repos,
        }
    }

    /// Build all three fetchers from config, sharing one transport, cache and
    /// observer. Fails if any upstream lacks a base URL or credential.
    pub fn from_config(
        config: &Config,
        transport: Arc<dyn Transport>,
        cache: Arc<ResponseCache>,
        observer: Arc<dyn FetchObserver>,
    ) -> Result<Self, ConfigError> {
        let weather = UpstreamSettings::from_config(UpstreamKind::Weather, config)?;
        let news = UpstreamSettings::from_config(UpstreamKind::News, config)?;
        let repos = UpstreamSettings::from_config(UpstreamKind::GitHub, config)?;

        Ok(Self::new(
            Fetcher::new(
                OpenWeather::new(weather),
                Arc::clone(&transport),
                Arc::clone(&cache),
                Arc::clone(&observer),
            ),
            Fetcher::new(
                NewsApi::new(news),
                Arc::clone(&transport),
                Arc::clone(&cache),
                Arc::clone(&observer),
            ),
            Fetcher::new(GitHubRepos::new(repos), transport, cache, observer),
        ))
    }

    pub fn weather(&self) -> &Fetcher<OpenWeather> {
        &self.weather
    }

    pub fn news(&self) -> &Fetcher<NewsApi> {
        &self.news
    }

    pub fn repos(&self) -> &Fetcher<GitHubRepos> {
        &self.repos
    }

    /// Run the three fetches concurrently and wait for all of them.
    ///
    /// Upstream outages are absorbed by the fetchers; an error here means a
    /// fetch panicked.
    pub async fn aggregate(
        &self,
        city: &str,
        keyword: &str,
        owner: &str,
    ) -> Result<AggregateResult, AggregateError> {
        let (weather, news, repositories) = tokio::join!(
            guarded(UpstreamKind::Weather, self.weather.fetch(city)),
            guarded(UpstreamKind::News, self.news.fetch(keyword)),
            guarded(UpstreamKind::GitHub, self.repos.fetch(owner)),
        );

        Ok(AggregateResult {
            weather: weather?,
            news: news?,
            repositories: repositories?,
        })
    }
}

async fn guarded<F>(upstream: UpstreamKind, fut: F) -> Result<F::Output, AggregateError>
where
    F: Future,
{
    AssertUnwindSafe(fut).catch_unwind().await.map_err(|payload| {
        let message = panic_message(&*payload);
        tracing::error!(upstream = %upstream, %message, "fetch panicked");
        AggregateError::Defect { upstream, message }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
