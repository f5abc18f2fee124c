//! Core types for npm operations.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The public npm registry.
pub const NPMJS_REGISTRY: &str = "https://registry.npmjs.org";

// =============================================================================
// Package origin
// =============================================================================

/// Scope and bare name of a package, derived from its `name` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOrigin {
    /// Scope including the `@`, e.g. `@acme`. `None` for unscoped packages.
    pub scope: Option<String>,
    /// Name without the scope.
    pub name: String,
}

impl PackageOrigin {
    /// Whether the package lives in the npm organization `org`.
    ///
    /// `org` may be given with or without the leading `@`.
    pub fn is_in_org(&self, org: &str) -> bool {
        let org = org.trim_start_matches('@');
        self.scope
            .as_deref()
            .and_then(|s| s.strip_prefix('@'))
            .is_some_and(|s| s == org)
    }
}

impl FromStr for PackageOrigin {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidPackageName(name.to_string());

        if let Some(rest) = name.strip_prefix('@') {
            let (scope, bare) = rest.split_once('/').ok_or_else(invalid)?;
            if scope.is_empty() || bare.is_empty() || bare.contains('/') {
                return Err(invalid());
            }
            return Ok(Self {
                scope: Some(format!("@{scope}")),
                name: bare.to_string(),
            });
        }

        if name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            scope: None,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for PackageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

// =============================================================================
// Team permissions
// =============================================================================

/// Package access level a team can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    /// Map any GitHub or npm permission word onto npm's two levels.
    ///
    /// `read-write`, `push`, `maintain` and `admin` (any case) grant
    /// read-write; everything else is read-only.
    pub fn normalize(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "read-write" | "push" | "maintain" | "admin" => Self::ReadWrite,
            _ => Self::ReadOnly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::ReadWrite => "read-write",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `@org:team` as npm addresses a team.
pub fn team_spec(scope: &str, team: &str) -> String {
    format!("{scope}:{team}")
}

/// Parse `npm team ls <org> --json` output into short name → `@org:team`.
pub fn parse_team_list(json: &str) -> Result<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let entries = value
        .as_array()
        .ok_or_else(|| Error::InvalidOutput("expected an array of teams".to_string()))?;

    entries
        .iter()
        .map(|entry| {
            let full = entry
                .as_str()
                .ok_or_else(|| Error::InvalidOutput(format!("team entry is not a string: {entry}")))?;
            let short = full.split_once(':').map_or(full, |(_, team)| team);
            Ok((short.to_string(), full.to_string()))
        })
        .collect()
}

/// Parse `npm org ls <org> --json` output into user → role.
pub fn parse_org_members(json: &str) -> Result<BTreeMap<String, String>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    if !value.is_object() {
        return Err(Error::InvalidOutput(
            "expected an object of org members".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

/// Compare registry URLs, ignoring trailing slashes.
pub fn same_registry(a: &str, b: &str) -> bool {
    a.trim().trim_end_matches('/') == b.trim().trim_end_matches('/')
}
