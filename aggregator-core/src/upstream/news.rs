use crate::{
    error::FetchError,
    model::{NewsArticle, NewsEnvelope, from_str_tolerant},
    transport::UpstreamRequest,
};

use super::{Upstream, UpstreamSettings, endpoint, normalize_param};

pub const DEFAULT_KEYWORD: &str = "General";

/// Articles per fetch; the upstream is asked for exactly this many.
pub const PAGE_SIZE: usize = 10;

/// Keyword search against NewsAPI, newest articles first.
#[derive(Debug, Clone)]
pub struct NewsApi {
    settings: UpstreamSettings,
}

impl NewsApi {
    pub fn new(settings: UpstreamSettings) -> Self {
        Self { settings }
    }
}

impl Upstream for NewsApi {
    type Output = Vec<NewsArticle>;

    fn settings(&self) -> &UpstreamSettings {
        &self.settings
    }

    fn normalize(&self, param: &str) -> String {
        normalize_param(param, DEFAULT_KEYWORD, true)
    }

    fn request(&self, keyword: &str) -> Result<UpstreamRequest, FetchError> {
        let page_size = PAGE_SIZE.to_string();
        let url = endpoint(
            &self.settings.base_url,
            &["everything"],
            &[
                ("q", keyword),
                ("apiKey", self.settings.api_key.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ],
        )?;

        Ok(UpstreamRequest::get(url))
    }

    fn parse(&self, body: &str) -> Result<Vec<NewsArticle>, FetchError> {
        let envelope: NewsEnvelope = from_str_tolerant(body)?;

        let mut articles = envelope.articles;
        if articles.is_empty() {
            return Err(FetchError::EmptyResult("articles"));
        }
        articles.truncate(PAGE_SIZE);

        Ok(articles)
    }

    fn fallback(&self) -> Vec<NewsArticle> {
        vec![NewsArticle {
            title: "No news available".to_string(),
            description: "We are unable to fetch news at this time. Please try again later."
                .to_string(),
            url: String::new(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamKind;

    fn upstream() -> NewsApi {
        let settings =
            UpstreamSettings::new(UpstreamKind::News, "https://newsapi.org/v2", "KEY").unwrap();
        NewsApi::new(settings)
    }

    #[test]
    fn keyword_is_lowercased_and_defaults_to_general() {
        let n = upstream();
        assert_eq!(n.normalize(""), "general");
        assert_eq!(n.normalize("  Rust Lang "), "rust lang");
    }

    #[test]
    fn request_asks_for_one_page_sorted_by_date() {
        let req = upstream().request("rust").unwrap();
        assert_eq!(
            req.url,
            "https://newsapi.org/v2/everything?q=rust&apiKey=KEY&sortBy=publishedAt&pageSize=10"
        );
    }

    #[test]
    fn empty_article_list_is_an_error() {
        let err = upstream()
            .parse(r#"{"status":"ok","totalResults":0,"articles":[]}"#)
            .unwrap_err();
        assert!(matches!(err, FetchError::EmptyResult("articles")));
    }

    #[test]
    fn results_are_capped_at_page_size_in_upstream_order() {
        let articles: Vec<_> = (0..15)
            .map(|i| serde_json::json!({"title": format!("a{i}"), "url": "u"}))
            .collect();
        let body = serde_json::json!({ "articles": articles }).to_string();

        let parsed = upstream().parse(&body).unwrap();
        assert_eq!(parsed.len(), PAGE_SIZE);
        assert_eq!(parsed[0].title, "a0");
        assert_eq!(parsed[9].title, "a9");
    }

    #[test]
    fn fallback_is_single_placeholder() {
        let fb = upstream().fallback();
        assert_eq!(fb.len(), 1);
        assert_eq!(fb[0].title, "No news available");
    }
}
