//! GitHub API client
//!
//! Minimal REST client for the three calls the crawler needs: stargazers of a
//! repository, repositories starred by a user, and a repository's clone URL.

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::str::FromStr;

use crate::error::ApiError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

/// Repository reference in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoName {
    type Err = ApiError;

    /// Accepts `owner/name` or any URL whose last two path segments are the owner
    /// and the name, e.g. `https://github.com/owner/name.git`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::InvalidRepository(s.to_string());

        let path = match url::Url::parse(s) {
            Ok(url) if url.has_host() => url.path().to_string(),
            _ => s.to_string(),
        };
        let mut segments = path
            .split(|c| c == '/' || c == ':')
            .filter(|segment| !segment.is_empty())
            .rev();

        let name = segments.next().ok_or_else(invalid)?;
        let owner = segments.next().ok_or_else(invalid)?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// The calls the crawler makes against a GitHub-style API.
///
/// Each method returns the complete, de-paginated list. Throttling is reported as
/// `ApiError::RateLimited` so callers can wait for the reset time.
pub trait StarSource {
    fn stargazers(&self, repo: &RepoName) -> impl Future<Output = Result<Vec<String>, ApiError>>;

    fn starred(&self, user: &str) -> impl Future<Output = Result<Vec<String>, ApiError>>;
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Deserialize)]
struct StarredRepository {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    clone_url: String,
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client with an optional token against `base_url`.
    pub fn new(token: Option<&str>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(token) = token {
            let mut auth = HeaderValue::from_str(&format!("token {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("starminer/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Canonical clone URL of `full_name`.
    pub async fn clone_url(&self, full_name: &str) -> Result<String, ApiError> {
        let url = format!("{}/repos/{}", self.base_url, full_name);
        let info: RepositoryInfo = self.get_json(&url).await?;
        Ok(info.clone_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self.client.get(url).send().await?;
        let rate_limit = extract_rate_limit_from_headers(resp.headers());
        let status = resp.status();

        if status.is_success() {
            return Ok(resp.json().await?);
        }
        if is_throttled(status, rate_limit) {
            // Without headers, fall back to waiting an hour like GitHub's primary window
            let reset_at = rate_limit
                .map(|info| info.reset_at)
                .unwrap_or_else(|| Utc::now() + chrono::Duration::hours(1));
            return Err(ApiError::RateLimited { reset_at });
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }

    /// Follow `page=N` until a short page comes back.
    async fn get_all_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        for page in 1.. {
            let url = format!("{}{}?per_page={}&page={}", self.base_url, path, PER_PAGE, page);
            let batch: Vec<T> = self.get_json(&url).await?;
            let done = batch.len() < PER_PAGE;
            debug!("{}: page {} returned {} items", path, page, batch.len());
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }
}

impl StarSource for GitHubClient {
    async fn stargazers(&self, repo: &RepoName) -> Result<Vec<String>, ApiError> {
        let path = format!("/repos/{}/{}/stargazers", repo.owner, repo.name);
        let users: Vec<User> = self.get_all_pages(&path).await?;
        Ok(users.into_iter().map(|u| u.login).collect())
    }

    async fn starred(&self, user: &str) -> Result<Vec<String>, ApiError> {
        let path = format!("/users/{}/starred", user);
        let repos: Vec<StarredRepository> = self.get_all_pages(&path).await?;
        Ok(repos.into_iter().map(|r| r.full_name).collect())
    }
}

/// 429 is always throttling; 403 only when the quota is spent.
fn is_throttled(status: StatusCode, rate_limit: Option<RateLimitInfo>) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => rate_limit.is_some_and(|info| info.remaining == 0),
        _ => false,
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_from_url() {
        let repo: RepoName = "https://github.com/octo/demo".parse().unwrap();
        assert_eq!(repo.full_name(), "octo/demo");

        let repo: RepoName = "https://github.com/octo/demo.git/".parse().unwrap();
        assert_eq!(repo.to_string(), "octo/demo");

        let repo: RepoName = "git@github.com:octo/demo.git".parse().unwrap();
        assert_eq!(repo, RepoName { owner: "octo".into(), name: "demo".into() });

        let repo: RepoName = "octo/demo".parse().unwrap();
        assert_eq!(repo.owner, "octo");
    }

    #[test]
    fn test_repo_name_rejects_single_segment() {
        assert!("demo".parse::<RepoName>().is_err());
        assert!("https://github.com/".parse::<RepoName>().is_err());
    }

    #[test]
    fn test_extract_rate_limit_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));

        let rate_limit = extract_rate_limit_from_headers(&headers).unwrap();
        assert_eq!(rate_limit.remaining, 0);
        assert_eq!(rate_limit.reset_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_extract_rate_limit_missing_headers() {
        assert!(extract_rate_limit_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_is_throttled() {
        let spent = Some(RateLimitInfo {
            remaining: 0,
            reset_at: DateTime::from_timestamp(1_704_067_200, 0).unwrap(),
        });
        let left = Some(RateLimitInfo { remaining: 10, ..spent.unwrap() });

        assert!(is_throttled(StatusCode::TOO_MANY_REQUESTS, None));
        assert!(is_throttled(StatusCode::FORBIDDEN, spent));
        assert!(!is_throttled(StatusCode::FORBIDDEN, left));
        assert!(!is_throttled(StatusCode::FORBIDDEN, None));
        assert!(!is_throttled(StatusCode::NOT_FOUND, spent));
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = GitHubClient::new(Some("test_token"), "https://api.github.com/").unwrap();
        assert_eq!(client.base_url(), DEFAULT_API_URL);
    }
}
