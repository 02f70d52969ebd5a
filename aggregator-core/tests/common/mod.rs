//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use aggregator_core::{
    Aggregator, Config, FetchError, FetchObserver, Fetcher, ResponseCache, Transport,
    TransportError, UpstreamKind, UpstreamRequest, UpstreamResponse, UpstreamSettings,
    upstream::{GitHubRepos, NewsApi, OpenWeather},
};
use async_trait::async_trait;
use tokio::sync::Barrier;

pub const WEATHER_BASE: &str = "https://weather.test/data/2.5";
pub const NEWS_BASE: &str = "https://news.test/v2";
pub const GITHUB_BASE: &str = "https://github.test";

#[derive(Debug, Clone)]
pub enum Reply {
    Respond { status: u16, body: String },
    Fail(String),
    Panic(String),
}

/// Scripted transport: the first route whose pattern occurs in the request
/// URL decides the reply. Unmatched requests get a 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<(String, Reply)>,
    requests: Mutex<Vec<UpstreamRequest>>,
    barrier: Option<Barrier>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, pattern: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push((
            pattern.to_string(),
            Reply::Respond {
                status,
                body: body.into(),
            },
        ));
        self
    }

    pub fn fail(mut self, pattern: &str, message: &str) -> Self {
        self.routes
            .push((pattern.to_string(), Reply::Fail(message.to_string())));
        self
    }

    pub fn panic_on(mut self, pattern: &str, message: &str) -> Self {
        self.routes
            .push((pattern.to_string(), Reply::Panic(message.to_string())));
        self
    }

    /// Hold every request until `n` requests are in flight at once.
    pub fn rendezvous(mut self, n: usize) -> Self {
        self.barrier = Some(Barrier::new(n));
        self
    }

    pub fn calls(&self) -> usize {
        self.lock().len()
    }

    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.lock().iter().filter(|r| r.url.contains(pattern)).count()
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UpstreamRequest>> {
        match self.requests.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: UpstreamRequest) -> Result<UpstreamResponse, TransportError> {
        let reply = self
            .routes
            .iter()
            .find(|(pattern, _)| request.url.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());
        self.lock().push(request);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }

        match reply {
            Some(Reply::Respond { status, body }) => Ok(UpstreamResponse { status, body }),
            Some(Reply::Fail(message)) => Err(TransportError::Failed(message)),
            Some(Reply::Panic(message)) => panic!("{message}"),
            None => Ok(UpstreamResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Counts observer events so tests can tell hits from misses.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub hits: AtomicUsize,
    pub misses: AtomicUsize,
    pub successes: AtomicUsize,
    pub fallbacks: AtomicUsize,
    pub reasons: Mutex<Vec<&'static str>>,
}

impl RecordingObserver {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::SeqCst)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<&'static str> {
        match self.reasons.lock() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }
}

impl FetchObserver for RecordingObserver {
    fn cache_hit(&self, _kind: UpstreamKind, _key: &str) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    fn cache_miss(&self, _kind: UpstreamKind, _key: &str) {
        self.misses.fetch_add(1, Ordering::SeqCst);
    }

    fn upstream_succeeded(&self, _kind: UpstreamKind, _key: &str, _elapsed: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn fell_back(&self, _kind: UpstreamKind, _key: &str, error: &FetchError) {
        self.fallbacks.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut g) = self.reasons.lock() {
            g.push(error.reason());
        }
    }
}

/// Everything a fetcher test needs, wired to one shared cache.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub cache: Arc<ResponseCache>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub fn new(transport: MockTransport) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: Arc::new(ResponseCache::new()),
            observer: Arc::new(RecordingObserver::default()),
        }
    }

    pub fn weather(&self) -> Fetcher<OpenWeather> {
        self.weather_with(settings(UpstreamKind::Weather))
    }

    pub fn weather_with(&self, settings: UpstreamSettings) -> Fetcher<OpenWeather> {
        Fetcher::new(
            OpenWeather::new(settings),
            self.transport.clone(),
            self.cache.clone(),
            self.observer.clone(),
        )
    }

    pub fn news(&self) -> Fetcher<NewsApi> {
        Fetcher::new(
            NewsApi::new(settings(UpstreamKind::News)),
            self.transport.clone(),
            self.cache.clone(),
            self.observer.clone(),
        )
    }

    pub fn repos(&self) -> Fetcher<GitHubRepos> {
        Fetcher::new(
            GitHubRepos::new(settings(UpstreamKind::GitHub)),
            self.transport.clone(),
            self.cache.clone(),
            self.observer.clone(),
        )
    }

    pub fn aggregator(&self) -> Aggregator {
        Aggregator::from_config(
            &test_config(),
            self.transport.clone(),
            self.cache.clone(),
            self.observer.clone(),
        )
        .expect("test config is complete")
    }
}

pub fn settings(kind: UpstreamKind) -> UpstreamSettings {
    let base = match kind {
        UpstreamKind::Weather => WEATHER_BASE,
        UpstreamKind::News => NEWS_BASE,
        UpstreamKind::GitHub => GITHUB_BASE,
    };
    UpstreamSettings::new(kind, base, "fake_api_key").expect("valid test settings")
}

pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.upsert_upstream(UpstreamKind::Weather, WEATHER_BASE.into(), "fake_api_key".into());
    cfg.upsert_upstream(UpstreamKind::News, NEWS_BASE.into(), "fake_api_key".into());
    cfg.upsert_upstream(UpstreamKind::GitHub, GITHUB_BASE.into(), "fake_token".into());
    cfg
}

pub const WEATHER_BODY: &str = r#"{"Name":"Athens","Main":{"Temp":20.5}}"#;

pub const NEWS_BODY: &str = r#"{"Articles":[{"Title":"Test Article","Description":"Test Description","Url":"https://example.com"}]}"#;

pub const REPOS_BODY: &str = r#"[{"Id":1,"Name":"TestRepo","Description":"Test Repository","Owner":{"Url":"https://example.com"}}]"#;

/// Transport answering all three upstreams successfully.
pub fn healthy_transport() -> MockTransport {
    MockTransport::new()
        .respond("weather.test", 200, WEATHER_BODY)
        .respond("news.test", 200, NEWS_BODY)
        .respond("github.test", 200, REPOS_BODY)
}
