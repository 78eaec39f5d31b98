//! HTTP plumbing: client construction, status handling and `Link` pagination.

use std::time::Duration;

use autocut::{RepositoryName, RepositoryOwner};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::GithubError;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: &str = "100";
const MAX_ERROR_BODY: usize = 500;

/// Connection settings for one repository.
#[derive(Clone)]
pub struct GithubConfig {
    /// REST API root, e.g. [`DEFAULT_API_BASE`] or a GitHub Enterprise URL.
    pub api_base: String,
    pub owner: RepositoryOwner,
    pub repo: RepositoryName,
    /// Personal access or installation token, sent as a bearer token.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl GithubConfig {
    /// Settings for the public API with a 30 second timeout.
    pub fn new(owner: RepositoryOwner, repo: RepositoryName, token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner,
            repo,
            token: token.into(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("autocut/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// GitHub REST client bound to one repository.
///
/// Implements [`autocut::IssueTracker`] and [`autocut::ProjectBoard`]. Requests
/// are never retried here; failures carry a retry hint instead.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    owner: RepositoryOwner,
    repo: RepositoryName,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        let api_base = config.api_base.trim_end_matches('/').to_string();
        Url::parse(&api_base)
            .map_err(|e| GithubError::Configuration(format!("api base {api_base:?}: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token.trim()))
            .map_err(|_| {
                GithubError::Configuration("token is not a valid header value".to_string())
            })?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GithubError::Configuration(e.to_string()))?;

        Ok(Self {
            http,
            api_base,
            owner: config.owner,
            repo: config.repo,
        })
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// `{api_base}/repos/{owner}/{repo}{suffix}`
    pub(crate) fn repo_url(&self, suffix: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_base, self.owner, self.repo, suffix)
    }

    /// `{api_base}{path}`
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub(crate) fn owner(&self) -> &RepositoryOwner {
        &self.owner
    }

    /// URL of the first page of a listing, with `per_page` and `page=1` added.
    pub(crate) fn first_page(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<String, GithubError> {
        let params = params
            .iter()
            .copied()
            .chain([("per_page", PER_PAGE), ("page", "1")]);
        Url::parse_with_params(url, params)
            .map(String::from)
            .map_err(|e| GithubError::Configuration(format!("url {url:?}: {e}")))
    }

    /// Sends a request and turns non-2xx responses into [`GithubError::Status`].
    pub(crate) async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, GithubError> {
        let response = request
            .send()
            .await
            .map_err(|source| GithubError::Network { operation, source })?;

        let status = response.status();
        tracing::debug!(operation, %status, url = %response.url(), "github response");
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = parse_retry_after(response.headers());
        let rate_limited = status == StatusCode::FORBIDDEN
            && response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0");
        let body = response.text().await.unwrap_or_default();
        Err(GithubError::Status {
            operation,
            status,
            message: truncate(&body, MAX_ERROR_BODY),
            retry_after,
            rate_limited,
        })
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, GithubError> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|source| GithubError::Decode { operation, source })
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
    ) -> Result<(Vec<T>, Option<String>), GithubError> {
        let response = self.send(operation, self.http.get(url)).await?;
        let next = next_page_url(response.headers());
        let items = response
            .json::<Vec<T>>()
            .await
            .map_err(|source| GithubError::Decode { operation, source })?;
        Ok((items, next))
    }

    /// Streams every item of a paginated listing starting at `first`.
    ///
    /// The next page is requested only once the current one has been consumed;
    /// the stream ends after the page without a `rel="next"` link.
    pub(crate) fn paginate<'a, T>(
        &'a self,
        operation: &'static str,
        first: String,
    ) -> BoxStream<'a, Result<T, GithubError>>
    where
        T: DeserializeOwned + Send + 'a,
    {
        stream::try_unfold(Some(first), move |next| async move {
            let Some(url) = next else {
                return Ok::<_, GithubError>(None);
            };
            let (items, next) = self.get_page::<T>(operation, &url).await?;
            let page = stream::iter(items.into_iter().map(Ok::<T, GithubError>));
            Ok(Some((page, next)))
        })
        .try_flatten()
        .boxed()
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
pub(crate) fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(header::LINK)?.to_str().ok()?;
    link.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')?
            .strip_suffix('>')
            .map(str::to_string)
    })
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::LINK, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn next_link_is_found_among_others() {
        let headers = link(
            "<https://api.github.com/repositories/1/issues?page=1>; rel=\"prev\", \
             <https://api.github.com/repositories/1/issues?page=3>; rel=\"next\", \
             <https://api.github.com/repositories/1/issues?page=9>; rel=\"last\"",
        );
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://api.github.com/repositories/1/issues?page=3")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let headers = link("<https://api.github.com/x?page=1>; rel=\"first\"");
        assert_eq!(next_page_url(&headers), None);
        assert_eq!(next_page_url(&HeaderMap::new()), None);
    }

    #[test]
    fn retry_after_seconds_are_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::RETRY_AFTER, HeaderValue::from_static("12"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(12)));

        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }

    #[test]
    fn config_debug_hides_the_token() {
        let config = GithubConfig::new(
            RepositoryOwner::new("acme").unwrap(),
            RepositoryName::new("widgets").unwrap(),
            "ghp_secret",
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn invalid_api_base_is_a_configuration_error() {
        let mut config = GithubConfig::new(
            RepositoryOwner::new("acme").unwrap(),
            RepositoryName::new("widgets").unwrap(),
            "t",
        );
        config.api_base = "not a url".to_string();
        assert!(matches!(
            GithubClient::new(config),
            Err(GithubError::Configuration(_))
        ));
    }

    #[test]
    fn first_page_url_carries_paging_parameters() {
        let client = GithubClient::new(GithubConfig::new(
            RepositoryOwner::new("acme").unwrap(),
            RepositoryName::new("widgets").unwrap(),
            "t",
        ))
        .unwrap();
        let url = client
            .first_page(
                &client.repo_url("/issues"),
                &[("labels", "autocut"), ("state", "all")],
            )
            .unwrap();
        assert_eq!(
            url,
            concat!(
                "https://api.github.com/repos/acme/widgets/issues",
                "?labels=autocut&state=all&per_page=100&page=1"
            )
        );
    }
}
