//! Blocking GitHub REST client.
//!
//! The client carries its credentials explicitly; nothing is read from the
//! process environment.

use crate::error::Result;
use crate::pages::Pages;
use crate::types::RepoRef;
use serde::Serialize;
use serde::de::DeserializeOwned;
use ureq::http::Response;
use ureq::{Body, RequestBuilder};

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Page size requested from every listing endpoint.
pub const PER_PAGE: u32 = 100;

const USER_AGENT: &str = concat!("skelkit/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// GitHub REST client.
///
/// # Example
///
/// ```no_run
/// use hubkit::{GitHubClient, RepoRef};
///
/// let client = GitHubClient::new(Some("ghp_xxx".to_string()));
/// let repo = client.repository(&RepoRef::new("acme", "skeleton")).unwrap();
/// println!("default branch: {}", repo.default_branch);
/// ```
pub struct GitHubClient {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// GitHub API base URL.
    api_base: String,
    /// Bearer token, if any.
    token: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Method {
    Post,
    Put,
    Patch,
}

impl GitHubClient {
    /// Create a client against the public GitHub API.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Create a client with a custom API base (for testing or GHES).
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Whether requests are authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL for an API path.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Start a paginated listing of `path`.
    ///
    /// `field` names the array inside an envelope object (e.g.
    /// `"environments"`); `None` means the body is the array itself.
    pub(crate) fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        field: Option<&'static str>,
    ) -> Pages<'_, T> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let first = format!("{}{}per_page={}", self.url(path), separator, PER_PAGE);
        Pages::new(self, first, field)
    }

    fn prepare<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    /// GET an absolute URL.
    pub(crate) fn get_url(&self, url: &str) -> Result<Response<Body>> {
        log::trace!("GET {url}");
        Ok(self.prepare(self.agent.get(url)).call()?)
    }

    /// GET a path and decode its JSON body.
    pub(crate) fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let mut response = self.get_url(&self.url(path))?;
        Ok(response.body_mut().read_json()?)
    }

    /// Send a JSON body to a path.
    pub(crate) fn send_json<T: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &T,
    ) -> Result<Response<Body>> {
        let url = self.url(path);
        log::trace!("{method:?} {url}");
        let request = match method {
            Method::Post => self.agent.post(&url),
            Method::Put => self.agent.put(&url),
            Method::Patch => self.agent.patch(&url),
        };
        Ok(self.prepare(request).send_json(body)?)
    }

    /// PUT a path with an empty body.
    pub(crate) fn put_empty(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        log::trace!("PUT {url}");
        self.prepare(self.agent.put(&url)).send_empty()?;
        Ok(())
    }

    /// POST raw bytes to an absolute URL.
    pub(crate) fn post_bytes(
        &self,
        url: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<Response<Body>> {
        log::trace!("POST {url} ({} bytes)", bytes.len());
        Ok(self
            .prepare(self.agent.post(url))
            .header("Content-Type", content_type)
            .send(bytes)?)
    }

    /// DELETE a path.
    pub(crate) fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        log::trace!("DELETE {url}");
        self.prepare(self.agent.delete(&url)).call()?;
        Ok(())
    }
}

/// Percent-encode one path segment.
pub(crate) fn seg(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `/repos/{owner}/{repo}`
pub(crate) fn repo_path(repo: &RepoRef) -> String {
    format!("/repos/{}/{}", seg(&repo.owner), seg(&repo.repo))
}
