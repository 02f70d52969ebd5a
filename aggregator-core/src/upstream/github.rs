use crate::{
    error::FetchError,
    model::{RepositoryEntry, RepositoryOwner, from_str_tolerant},
    transport::UpstreamRequest,
};

use super::{Upstream, UpstreamSettings, endpoint, normalize_param};

pub const DEFAULT_OWNER: &str = "Mixmavr";

const USER_AGENT: &str = "api-aggregator";

/// Public repository listing of a GitHub user.
#[derive(Debug, Clone)]
pub struct GitHubRepos {
    settings: UpstreamSettings,
}

impl GitHubRepos {
    pub fn new(settings: UpstreamSettings) -> Self {
        Self { settings }
    }
}

impl Upstream for GitHubRepos {
    type Output = Vec<RepositoryEntry>;

    fn settings(&self) -> &UpstreamSettings {
        &self.settings
    }

    fn normalize(&self, param: &str) -> String {
        normalize_param(param, DEFAULT_OWNER, true)
    }

    fn request(&self, owner: &str) -> Result<UpstreamRequest, FetchError> {
        let url = endpoint(&self.settings.base_url, &["users", owner, "repos"], &[])?;

        Ok(UpstreamRequest::get(url)
            .with_header("Authorization", format!("Bearer {}", self.settings.api_key))
            .with_header("Accept", "application/vnd.github+json")
            .with_header("User-Agent", USER_AGENT))
    }

    fn parse(&self, body: &str) -> Result<Vec<RepositoryEntry>, FetchError> {
        let repos: Vec<RepositoryEntry> = from_str_tolerant(body)?;

        if repos.is_empty() {
            return Err(FetchError::EmptyResult("repositories"));
        }

        Ok(repos)
    }

    fn fallback(&self) -> Vec<RepositoryEntry> {
        vec![RepositoryEntry {
            id: 0,
            name: "No repositories available".to_string(),
            description:
                "We are unable to fetch repositories at this time. Please try again later."
                    .to_string(),
            owner: RepositoryOwner::default(),
        }]
    }
}
