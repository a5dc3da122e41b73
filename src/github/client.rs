use crate::config::GithubConfig;
use crate::github::types::{
    push_activity, summarize_profile, ActivityItem, GhEvent, GhRepo, GhUser, GithubStats,
    RepoSummary,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Failure talking to the GitHub REST API. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Thin client for one GitHub account's public data.
pub struct GithubClient {
    client: reqwest::Client,
    base_url: url::Url,
    username: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: url::Url::parse(&config.api_base_url)?,
            username: config.username.clone(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Profile counts and the full repo list, fetched concurrently.
    pub async fn fetch_profile_and_repo_summary(&self) -> Result<GithubStats, UpstreamError> {
        let (user, repos) = tokio::try_join!(
            self.get_json::<GhUser>(&[], &[]),
            self.get_json::<Vec<GhRepo>>(&["repos"], &[("per_page", "100")]),
        )?;
        Ok(summarize_profile(&user, &repos))
    }

    /// Most recently updated repos, reshaped for display.
    pub async fn fetch_recent_repos(&self, limit: u32) -> Result<Vec<RepoSummary>, UpstreamError> {
        let per_page = limit.clamp(1, 100).to_string();
        let repos: Vec<GhRepo> = self
            .get_json(&["repos"], &[("sort", "updated"), ("per_page", per_page.as_str())])
            .await?;
        Ok(repos.into_iter().map(RepoSummary::from).collect())
    }

    /// Push events from the public event feed.
    pub async fn fetch_recent_activity(&self) -> Result<Vec<ActivityItem>, UpstreamError> {
        let events: Vec<GhEvent> = self
            .get_json(&["events", "public"], &[("per_page", "100")])
            .await?;
        Ok(push_activity(events))
    }

    /// `/users/{username}/{segments..}` with the given query pairs.
    fn user_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<url::Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push("users")
            .push(&self.username)
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, UpstreamError> {
        let url = self.user_url(segments, query)?;
        tracing::debug!(url = %url, "github request");

        let resp = self.client.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                endpoint: url.path().to_string(),
                status,
            });
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GithubClient {
        GithubClient::new(&GithubConfig {
            api_base_url: base.to_string(),
            username: "octocat".to_string(),
            ..GithubConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_user_url_layout() {
        let gh = client("https://api.github.com");
        let url = gh
            .user_url(&["repos"], &[("sort", "updated"), ("per_page", "6")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/users/octocat/repos?sort=updated&per_page=6"
        );

        let profile = gh.user_url(&[], &[]).unwrap();
        assert_eq!(profile.as_str(), "https://api.github.com/users/octocat");
    }

    #[test]
    fn test_user_url_keeps_base_path_prefix() {
        let gh = client("http://127.0.0.1:4000/gh/");
        let url = gh.user_url(&["events", "public"], &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4000/gh/users/octocat/events/public");
    }

    #[test]
    fn test_invalid_token_header_is_rejected() {
        let result = GithubClient::new(&GithubConfig {
            token: Some("bad\ntoken".to_string()),
            ..GithubConfig::default()
        });
        assert!(matches!(result, Err(UpstreamError::Header(_))));
    }

    #[tokio::test]
    async fn test_network_failure_is_upstream_error() {
        let gh = GithubClient::new(&GithubConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..GithubConfig::default()
        })
        .unwrap();
        assert!(matches!(
            gh.fetch_recent_activity().await,
            Err(UpstreamError::Http(_))
        ));
    }
}
