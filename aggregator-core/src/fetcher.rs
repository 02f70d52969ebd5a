use std::sync::Arc;
use std::time::Instant;

use crate::{
    cache::ResponseCache,
    error::FetchError,
    observe::FetchObserver,
    transport::Transport,
    upstream::Upstream,
};

/// Fetch-cache-fallback pipeline around one [`Upstream`].
///
/// [`fetch`](Fetcher::fetch) always yields a value: cached data, fresh data,
/// or the upstream's fallback. Only fresh data is ever written to the cache.
#[derive(Debug)]
pub struct Fetcher<U: Upstream> {
    upstream: U,
    transport: Arc<dyn Transport>,
    cache: Arc<ResponseCache>,
    observer: Arc<dyn FetchObserver>,
}

impl<U: Upstream> Fetcher<U> {
    pub fn new(
        upstream: U,
        transport: Arc<dyn Transport>,
        cache: Arc<ResponseCache>,
        observer: Arc<dyn FetchObserver>,
    ) -> Self {
        Self {
            upstream,
            transport,
            cache,
            observer,
        }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub fn cache_key(&self, normalized: &str) -> String {
        format!("{}Cache_{}", self.upstream.kind().cache_prefix(), normalized)
    }

    pub async fn fetch(&self, param: &str) -> U::Output {
        let kind = self.upstream.kind();
        let normalized = self.upstream.normalize(param);
        let key = self.cache_key(&normalized);

        if let Some(cached) = self.cache.try_get::<U::Output>(&key) {
            self.observer.cache_hit(kind, &key);
            return cached;
        }
        self.observer.cache_miss(kind, &key);

        let started = Instant::now();
        match self.fetch_live(&normalized).await {
            Ok(value) => {
                self.cache.set(key.as_str(), value.clone(), self.upstream.ttl());
                self.observer.upstream_succeeded(kind, &key, started.elapsed());
                value
            }
            Err(e) => {
                self.observer.fell_back(kind, &key, &e);
                self.upstream.fallback()
            }
        }
    }

    async fn fetch_live(&self, normalized: &str) -> Result<U::Output, FetchError> {
        let request = self.upstream.request(normalized)?;
        let res = self.transport.execute(request).await?;

        if res.status != 200 {
            return Err(FetchError::Status {
                status: res.status,
                body: truncate_body(&res.body),
            });
        }
        if res.body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }

        self.upstream.parse(&res.body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
