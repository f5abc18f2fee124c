//! Releases and release assets.

use crate::client::{GitHubClient, Method, repo_path};
use crate::error::{Error, Result};
use crate::types::{NewRelease, Release, RepoRef};
use std::path::Path;

impl GitHubClient {
    /// Create a release; returns the created release with its upload URL.
    pub fn create_release(&self, repo: &RepoRef, release: &NewRelease) -> Result<Release> {
        let mut response =
            self.send_json(Method::Post, &format!("{}/releases", repo_path(repo)), release)?;
        Ok(response.body_mut().read_json()?)
    }

    /// Upload a file as a release asset named `name`.
    pub fn upload_release_asset(&self, release: &Release, name: &str, file: &Path) -> Result<()> {
        let bytes = std::fs::read(file).map_err(|e| Error::io(file, e))?;
        let url = release.asset_upload_url(name);
        log::debug!("Uploading {} as {name}", file.display());
        self.post_bytes(&url, content_type(name), &bytes)?;
        Ok(())
    }
}

fn content_type(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("zip") => "application/zip",
        Some("gz" | "tgz") => "application/gzip",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
