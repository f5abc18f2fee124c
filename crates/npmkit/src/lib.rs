//! # npmkit
//!
//! npm CLI wrapper for the package-level chores of a project: working out a
//! package's npmjs origin, probing org admin rights, listing org teams,
//! granting and revoking team access, and publishing.
//!
//! ## Example
//!
//! ```no_run
//! use npmkit::{Client, Permission};
//!
//! let client = Client::new(".", [("NPM_TOKEN", "npm_xxx")]);
//!
//! if client.can_admin_org("@acme")? {
//!     for (team, full) in client.org_teams("@acme")? {
//!         println!("{team} ({full})");
//!     }
//!     client.grant_team("@acme", "owners", Permission::ReadWrite)?;
//! }
//! # Ok::<(), npmkit::Error>(())
//! ```

pub mod backend;
pub mod error;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{NPMJS_REGISTRY, PackageOrigin, Permission};

use backend::Backend;
use backend::npm::NpmBackend;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// High-level client for npm operations.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client running the real npm CLI in `cwd` with `env` added to
    /// each child process.
    pub fn new<I, K, V>(cwd: impl Into<PathBuf>, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            backend: Box::new(NpmBackend::new(cwd).env(env)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Check if npm is available.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    // =========================================================================
    // Organization
    // =========================================================================

    /// Whether the current npm user administers the org `scope`.
    ///
    /// Only admins and owners may list org members, so an authorization
    /// refusal means "no". Any other failure is returned as an error.
    pub fn can_admin_org(&self, scope: &str) -> Result<bool> {
        match self.backend.org_members(scope) {
            Ok(json) => {
                types::parse_org_members(&json)?;
                Ok(true)
            }
            Err(e) if e.is_permission_denied() => {
                log::debug!("npm org ls {scope} refused: {e}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Teams of the org `scope`, short name → `@org:team`.
    pub fn org_teams(&self, scope: &str) -> Result<BTreeMap<String, String>> {
        let json = self.backend.org_teams(scope)?;
        types::parse_team_list(&json)
    }

    /// Grant `team` of `scope` access to the current package.
    pub fn grant_team(&self, scope: &str, team: &str, permission: Permission) -> Result<()> {
        self.backend
            .grant(permission, &types::team_spec(scope, team))
    }

    /// Revoke `team` of `scope` from the current package.
    pub fn revoke_team(&self, scope: &str, team: &str) -> Result<()> {
        self.backend.revoke(&types::team_spec(scope, team))
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// The configured registry URL.
    pub fn registry(&self) -> Result<String> {
        self.backend.registry()
    }

    /// Whether the configured registry is the public npmjs registry.
    pub fn is_registry_npmjs(&self) -> Result<bool> {
        Ok(types::same_registry(&self.backend.registry()?, NPMJS_REGISTRY))
    }

    /// Whether `package_name` has an npmjs origin and is already published
    /// there.
    ///
    /// Any failure along the way counts as "no".
    pub fn is_published_at_npmjs(&self, package_name: &str) -> bool {
        package_name.parse::<PackageOrigin>().is_ok()
            && self.is_registry_npmjs().unwrap_or(false)
            && self.backend.owners().is_ok()
    }

    // =========================================================================
    // Package lifecycle
    // =========================================================================

    pub fn publish(&self) -> Result<()> {
        self.backend.publish()
    }

    pub fn install(&self) -> Result<()> {
        self.backend.install()
    }

    pub fn clean_install(&self) -> Result<()> {
        self.backend.clean_install()
    }

    pub fn update(&self) -> Result<()> {
        self.backend.update()
    }
}
