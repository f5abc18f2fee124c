//! Records exchanged with the GitHub REST API.
//!
//! Responses are deserialized into these types at the client boundary; a
//! missing required field is reported as [`crate::Error::InvalidResponse`]
//! instead of surfacing later as an empty value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An `owner/repo` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// Owner login (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoRef {
    /// Create a new repository reference.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository metadata (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub default_branch: String,
    pub owner: Account,
    #[serde(default)]
    pub organization: Option<Account>,
    #[serde(default)]
    pub permissions: Option<Permissions>,
}

impl Repository {
    /// Whether the repository belongs to the organization `org`.
    #[must_use]
    pub fn is_owned_by_org(&self, org: &str) -> bool {
        self.owner.kind == "Organization"
            && self
                .organization
                .as_ref()
                .is_some_and(|o| o.login == org)
    }

    /// Whether the authenticated user has admin rights.
    #[must_use]
    pub fn can_admin(&self) -> bool {
        self.permissions.as_ref().is_some_and(|p| p.admin)
    }
}

/// A user or organization account.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Permissions of the authenticated user on a repository.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// Repository settings sent with `PATCH /repos/{owner}/{repo}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepoSettings {
    pub has_wiki: bool,
    pub has_issues: bool,
    pub has_projects: bool,
    pub has_discussions: bool,
    pub has_downloads: bool,

    pub allow_auto_merge: bool,
    pub allow_squash_merge: bool,
    pub allow_merge_commit: bool,
    pub allow_rebase_merge: bool,
    pub allow_update_branch: bool,
    pub delete_branch_on_merge: bool,

    pub merge_commit_title: String,
    pub merge_commit_message: String,
    pub squash_merge_commit_title: String,
    pub squash_merge_commit_message: String,

    pub web_commit_signoff_required: bool,

    pub homepage: String,
    pub description: String,
    pub is_template: bool,
}

// =============================================================================
// Labels, teams, branches
// =============================================================================

/// A repository label as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Desired label attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    /// Hex color without the leading `#`.
    pub color: String,
    #[serde(default, alias = "desc")]
    pub description: String,
}

impl LabelSpec {
    pub fn new(color: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            description: description.into(),
        }
    }
}

/// A team with access to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Team {
    pub slug: String,
    #[serde(default)]
    pub permission: String,
}

/// A branch as listed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
}

/// Users, teams and apps allowed by a branch protection rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Actors {
    pub users: Vec<String>,
    pub teams: Vec<String>,
    pub apps: Vec<String>,
}

impl Actors {
    /// Only the given teams.
    pub fn teams(teams: &[&str]) -> Self {
        Self {
            teams: teams.iter().map(|t| (*t).to_string()).collect(),
            ..Default::default()
        }
    }
}

/// Pull request review requirements of a branch protection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestReviews {
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_approving_review_count: u8,
    pub require_last_push_approval: bool,
    pub dismissal_restrictions: Actors,
    pub bypass_pull_request_allowances: Actors,
}

/// Body of `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchProtection {
    pub lock_branch: bool,
    pub block_creations: bool,
    pub allow_deletions: bool,
    pub allow_fork_syncing: bool,
    pub allow_force_pushes: bool,

    pub required_signatures: bool,
    pub required_linear_history: bool,
    pub required_conversation_resolution: bool,
    /// Always serialized, `null` disables status checks.
    pub required_status_checks: Option<StatusChecks>,

    pub restrictions: Option<Actors>,
    pub required_pull_request_reviews: Option<PullRequestReviews>,
    pub enforce_admins: bool,
}

/// Required status checks of a branch protection rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChecks {
    pub strict: bool,
    pub contexts: Vec<String>,
}

// =============================================================================
// Environments and secrets
// =============================================================================

/// A deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub id: Option<u64>,
}

/// Deployment branch policy of an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentBranchPolicy {
    pub protected_branches: bool,
    pub custom_branch_policies: bool,
}

/// Body of `PUT /repos/{owner}/{repo}/environments/{environment_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentSettings {
    pub deployment_branch_policy: DeploymentBranchPolicy,
}

impl EnvironmentSettings {
    /// Deployments restricted to custom branch policies.
    pub fn custom_branch_policies() -> Self {
        Self {
            deployment_branch_policy: DeploymentBranchPolicy {
                protected_branches: false,
                custom_branch_policies: true,
            },
        }
    }
}

/// A custom deployment branch policy of an environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BranchPolicy {
    pub id: u64,
    pub name: String,
}

/// An environment secret (values are never returned).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Secret {
    pub name: String,
}

/// Public key used to seal secret values for an environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicKey {
    pub key_id: String,
    /// Base64-encoded X25519 public key.
    pub key: String,
}

/// Body of a secret create/update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncryptedSecret {
    pub encrypted_value: String,
    pub key_id: String,
}

// =============================================================================
// Releases
// =============================================================================

/// Body of `POST /repos/{owner}/{repo}/releases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    pub name: String,
    pub tag_name: String,
    pub draft: bool,
    pub generate_release_notes: bool,
    pub prerelease: bool,
}

/// A created release.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub id: u64,
    /// RFC 6570 template, e.g. `https://uploads.github.com/.../assets{?name,label}`.
    pub upload_url: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl Release {
    /// Upload URL for an asset named `name`, with the URI template expanded.
    #[must_use]
    pub fn asset_upload_url(&self, name: &str) -> String {
        let base = self
            .upload_url
            .split_once('{')
            .map_or(self.upload_url.as_str(), |(base, _)| base);
        format!("{}?name={}", base, urlencoding::encode(name))
    }
}
