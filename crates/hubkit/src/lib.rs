//! # hubkit
//!
//! Blocking client for the slice of the GitHub REST API that repository
//! standards need.
//!
//! This crate provides:
//! - Repository settings and Dependabot toggles
//! - Labels, team access and branch protection
//! - Deployment environments, branch policies and sealed secrets
//! - Releases with asset uploads
//!
//! Listings are exposed as lazy [`Pages`] iterators that follow the
//! `Link: rel="next"` header; each yields one page as `Result<Vec<T>>`.
//!
//! ## Example
//!
//! ```no_run
//! use hubkit::{GitHubClient, RepoRef};
//!
//! let client = GitHubClient::new(std::env::var("USER_GITHUB_TOKEN").ok());
//! let repo = RepoRef::new("acme", "skeleton");
//!
//! for page in client.labels(&repo) {
//!     for label in page? {
//!         println!("{} #{}", label.name, label.color);
//!     }
//! }
//! # Ok::<(), hubkit::Error>(())
//! ```

pub mod client;
pub mod environments;
pub mod error;
pub mod pages;
pub mod releases;
pub mod repos;
pub mod seal;
pub mod types;

pub use client::{DEFAULT_API_BASE, GitHubClient, PER_PAGE};
pub use error::{Error, ErrorCategory, Result};
pub use pages::Pages;
pub use seal::seal_secret;
pub use types::*;
