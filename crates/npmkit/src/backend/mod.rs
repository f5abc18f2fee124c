//! Backend abstraction for npm operations.
//!
//! The [`Backend`] trait defines the npm commands the client needs,
//! allowing for different implementations (real CLI, mock for testing).

pub mod mock;
pub mod npm;

use crate::error::Result;
use crate::types::Permission;

/// Backend trait for npm operations.
///
/// Every method maps to one npm invocation run in the package directory.
pub trait Backend: Send + Sync {
    /// Check if npm is available.
    fn is_available(&self) -> bool;

    /// `npm org ls <scope> --json`; raw JSON output.
    ///
    /// Only org admins and owners may list members.
    fn org_members(&self, scope: &str) -> Result<String>;

    /// `npm team ls <scope> --json`; raw JSON output.
    fn org_teams(&self, scope: &str) -> Result<String>;

    /// `npm access grant <permission> <@org:team>` for the current package.
    fn grant(&self, permission: Permission, team: &str) -> Result<()>;

    /// `npm access revoke <@org:team>` for the current package.
    fn revoke(&self, team: &str) -> Result<()>;

    /// `npm config get registry`.
    fn registry(&self) -> Result<String>;

    /// `npm author ls`; fails when the package is not published.
    fn owners(&self) -> Result<Vec<String>>;

    /// `npm publish`.
    fn publish(&self) -> Result<()>;

    /// `npm install`.
    fn install(&self) -> Result<()>;

    /// `npm ci`.
    fn clean_install(&self) -> Result<()>;

    /// `npm update --save`.
    fn update(&self) -> Result<()>;
}
