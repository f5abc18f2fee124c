//! In-memory backend for tests.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::Permission;
use std::sync::{Arc, Mutex};

/// How the mock answers `npm org ls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgAccess {
    /// Caller can list members.
    Admin,
    /// npm answers `E403`.
    Denied,
    /// npm fails for an unrelated reason (`ENOTFOUND`).
    Broken,
}

/// Scriptable backend that records every mutating call.
///
/// Clones share the call log, so a test can keep one clone while the
/// client owns the other.
#[derive(Debug, Clone)]
pub struct MockBackend {
    access: OrgAccess,
    teams: Vec<String>,
    registry: String,
    published: bool,
    fail_grant: bool,
    fail_revoke: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            access: OrgAccess::Admin,
            teams: Vec::new(),
            registry: crate::types::NPMJS_REGISTRY.to_string(),
            published: true,
            fail_grant: false,
            fail_revoke: false,
            calls: Arc::default(),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Org teams as npm lists them (`@org:team`).
    #[must_use]
    pub fn with_teams(mut self, teams: &[&str]) -> Self {
        self.teams = teams.iter().map(|t| (*t).to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: OrgAccess) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = registry.into();
        self
    }

    #[must_use]
    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    /// Make every `npm access grant` fail.
    #[must_use]
    pub fn failing_grant(mut self) -> Self {
        self.fail_grant = true;
        self
    }

    /// Make every `npm access revoke` fail.
    #[must_use]
    pub fn failing_revoke(mut self) -> Self {
        self.fail_revoke = true;
        self
    }

    /// Mutating calls made so far, e.g. `grant read-write @acme:owners`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Backend for MockBackend {
    fn is_available(&self) -> bool {
        true
    }

    fn org_members(&self, scope: &str) -> Result<String> {
        match self.access {
            OrgAccess::Admin => Ok(r#"{"alice": "owner"}"#.to_string()),
            OrgAccess::Denied => Err(Error::from_npm_output(
                &format!("npm ERR! code E403\nnpm ERR! 403 Forbidden - org {scope}"),
                "org",
            )),
            OrgAccess::Broken => Err(Error::from_npm_output(
                "npm ERR! code ENOTFOUND\nnpm ERR! getaddrinfo ENOTFOUND registry.npmjs.org",
                "org",
            )),
        }
    }

    fn org_teams(&self, _scope: &str) -> Result<String> {
        Ok(serde_json::to_string(&self.teams)?)
    }

    fn grant(&self, permission: Permission, team: &str) -> Result<()> {
        self.record(format!("grant {permission} {team}"));
        if self.fail_grant {
            return Err(Error::from_npm_output("npm ERR! code E500", "access"));
        }
        Ok(())
    }

    fn revoke(&self, team: &str) -> Result<()> {
        self.record(format!("revoke {team}"));
        if self.fail_revoke {
            return Err(Error::from_npm_output("npm ERR! code E404", "access"));
        }
        Ok(())
    }

    fn registry(&self) -> Result<String> {
        Ok(self.registry.clone())
    }

    fn owners(&self) -> Result<Vec<String>> {
        if self.published {
            Ok(vec!["alice".to_string()])
        } else {
            Err(Error::from_npm_output("npm ERR! code E404", "author"))
        }
    }

    fn publish(&self) -> Result<()> {
        self.record("publish".to_string());
        Ok(())
    }

    fn install(&self) -> Result<()> {
        self.record("install".to_string());
        Ok(())
    }

    fn clean_install(&self) -> Result<()> {
        self.record("ci".to_string());
        Ok(())
    }

    fn update(&self) -> Result<()> {
        self.record("update".to_string());
        Ok(())
    }
}
