//! HTTP client shared by the GraphQL and REST transports.

use std::time::Duration;

use audit::TransportError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

#[path = "client_tests.rs"]
#[cfg(test)]
mod tests;

/// Base URL of the public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Connection settings for [`GithubClient`].
#[derive(Clone)]
pub struct GithubConfig {
    /// REST base URL, e.g. `https://api.github.com` or
    /// `https://ghe.example.com/api/v3`.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// A GitHub API client implementing both transport ports.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    rest_base: String,
    graphql_url: String,
    token: String,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("rest_base", &self.rest_base)
            .field("graphql_url", &self.graphql_url)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    /// Builds the underlying HTTP client.
    pub fn new(config: GithubConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| TransportError::Network(format!("invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, user_agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(network_error)?;

        let rest_base = config.api_url.trim_end_matches('/').to_owned();
        Ok(Self {
            http,
            graphql_url: graphql_url(&rest_base),
            rest_base,
            token: config.token,
        })
    }

    pub(crate) fn graphql_endpoint(&self) -> &str {
        &self.graphql_url
    }

    /// Starts an authenticated request against a REST path.
    pub(crate) fn rest(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorized(method, &format!("{}{}", self.rest_base, path))
    }

    pub(crate) fn authorized(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.token)
    }

    /// Sends the request and turns any non-success status into
    /// [`TransportError::Http`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Received response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(http_error(status, &body))
    }
}

/// The GraphQL endpoint that belongs to a REST base URL.
///
/// GitHub Enterprise Server serves REST under `/api/v3` and GraphQL under
/// `/api/graphql`; github.com serves GraphQL at `/graphql`.
pub(crate) fn graphql_url(rest_base: &str) -> String {
    match rest_base.strip_suffix("/api/v3") {
        Some(host) => format!("{host}/api/graphql"),
        None => format!("{rest_base}/graphql"),
    }
}

pub(crate) fn network_error(error: reqwest::Error) -> TransportError {
    if error.is_decode() {
        TransportError::Decode(error.to_string())
    } else {
        TransportError::Network(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a failed response to [`TransportError::Http`], preferring the API's
/// own `message` over the status reason.
pub(crate) fn http_error(status: StatusCode, body: &str) -> TransportError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown status").to_owned());
    TransportError::Http {
        status: status.as_u16(),
        message,
    }
}

/// Decodes a JSON response body.
pub(crate) async fn json_body<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<T, TransportError> {
    let bytes = response.bytes().await.map_err(network_error)?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
}
