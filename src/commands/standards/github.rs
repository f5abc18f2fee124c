//! Repo settings, labels, teams and branch protection (`standards github`).

use anyhow::{Context, Result, bail};
use declarative::{Mutator, Operation, fold_pages, merge_baseline, reconcile};
use hubkit::{
    Actors, Branch, BranchProtection, GitHubClient, Label, LabelSpec, PullRequestReviews, RepoRef,
    RepoSettings, Repository, Team,
};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use super::{admin_repo, is_current, origin, record};
use crate::Context as AppContext;
use crate::config::{GITHUB_CONFIG_VERSION, keys};
use crate::manifest::Manifest;

/// Branches that are always protected.
const PROTECTED_BRANCHES: &[&str] = &["main"];

pub fn run(ctx: &AppContext, dry_run: bool) -> Result<()> {
    let repo = origin(ctx)?;
    let mut manifest = Manifest::load(&ctx.settings.package_json())?;
    configure(ctx, &ctx.settings.github(), &repo, &mut manifest, dry_run)
}

/// Bring `repo` in line with the org-wide repo standards.
///
/// Returns quietly when the repo is not an org repo the caller administers,
/// or when the recorded config version is current.
pub fn configure(
    ctx: &AppContext,
    client: &GitHubClient,
    repo: &RepoRef,
    manifest: &mut Manifest,
    dry_run: bool,
) -> Result<()> {
    let Some(info) = admin_repo(client, repo, &ctx.settings.org)? else {
        return Ok(());
    };
    if is_current(manifest, keys::GITHUB_CONFIG_VERSION, GITHUB_CONFIG_VERSION) {
        ctx.step(&format!(
            "GitHub repo configuration is up-to-date @v{GITHUB_CONFIG_VERSION}."
        ));
        return Ok(());
    }
    if info.default_branch != "main" {
        bail!(
            "Default branch at GitHub must be `main` (found `{}`)",
            info.default_branch
        );
    }

    let labels = desired_labels(manifest)?;
    let teams = desired_teams(manifest)?;

    let actual_labels = fold_pages(client.labels(repo), |l: &Label| l.name.clone())
        .context("Failed to list GitHub repo labels")?;
    let actual_teams = fold_pages(client.repo_teams(repo), |t: &Team| t.slug.clone())
        .context("Failed to list GitHub repo teams")?;
    let actual_branches = fold_pages(client.protected_branches(repo), |b: &Branch| b.name.clone())
        .context("Failed to list GitHub repo protected branches")?;

    ctx.step("Configuring GitHub repo using org-wide standards.");
    if !dry_run {
        client
            .update_repository(repo, &repo_settings(&info, repo, manifest))
            .context("Failed to update GitHub repo settings")?;
        client.enable_vulnerability_alerts(repo)?;
        client.enable_automated_security_fixes(repo)?;
    }

    let mut observer = ctx.reporter();

    let mut mutator = LabelMutator {
        client,
        repo,
        actual: &actual_labels,
    };
    reconcile(&labels, &actual_labels, &[], &mut mutator, &mut observer, dry_run)?;

    let mut mutator = TeamMutator {
        client,
        repo,
        actual: &actual_teams,
    };
    reconcile(&teams, &actual_teams, &[], &mut mutator, &mut observer, dry_run)?;

    let protections: BTreeMap<String, BranchProtection> = PROTECTED_BRANCHES
        .iter()
        .map(|b| ((*b).to_string(), branch_protection()))
        .collect();
    let mut mutator = BranchMutator { client, repo };
    reconcile(
        &protections,
        &actual_branches,
        PROTECTED_BRANCHES,
        &mut mutator,
        &mut observer,
        dry_run,
    )?;

    record(
        manifest,
        keys::GITHUB_CONFIG_VERSION,
        GITHUB_CONFIG_VERSION,
        dry_run,
    )
}

// ============================================================================
// Desired state
// ============================================================================

fn baseline_labels() -> BTreeMap<String, LabelSpec> {
    [
        ("bug report", "b60205", "Something isn’t working."),
        ("good first issue", "fef2c0", "Good first issue for newcomers."),
        ("question", "0e8a16", "Something is being asked."),
        ("request", "1d76db", "Something is being requested."),
        ("robotic", "eeeeee", "Something created robotically."),
        ("suggestion", "fbca04", "Something is being suggested."),
    ]
    .into_iter()
    .map(|(name, color, desc)| (name.to_string(), LabelSpec::new(color, desc)))
    .collect()
}

fn baseline_teams() -> BTreeMap<String, String> {
    [("owners", "admin"), ("security-managers", "pull")]
        .into_iter()
        .map(|(team, permission)| (team.to_string(), permission.to_string()))
        .collect()
}

/// Overrides stored in `package.json`; absent means none.
fn overrides<T: DeserializeOwned>(manifest: &Manifest, path: &[&str]) -> Result<BTreeMap<String, T>> {
    match manifest.get(path) {
        None => Ok(BTreeMap::new()),
        Some(value) => serde_json::from_value(value.clone())
            .with_context(|| format!("Invalid `{}` in package.json", path.join("."))),
    }
}

/// Project labels merged under the baseline; colors lose any leading `#`.
pub(crate) fn desired_labels(manifest: &Manifest) -> Result<BTreeMap<String, LabelSpec>> {
    let mut custom: BTreeMap<String, LabelSpec> = overrides(manifest, keys::GITHUB_LABELS)?;
    for spec in custom.values_mut() {
        spec.color = spec.color.trim_start_matches('#').to_string();
    }
    Ok(merge_baseline(&baseline_labels(), &custom))
}

pub(crate) fn desired_teams(manifest: &Manifest) -> Result<BTreeMap<String, String>> {
    let custom = overrides(manifest, keys::GITHUB_TEAMS)?;
    Ok(merge_baseline(&baseline_teams(), &custom))
}

fn repo_settings(info: &Repository, repo: &RepoRef, manifest: &Manifest) -> RepoSettings {
    RepoSettings {
        has_wiki: true,
        has_issues: true,
        has_projects: true,
        has_discussions: true,
        has_downloads: true,

        allow_auto_merge: false,
        allow_squash_merge: true,
        allow_merge_commit: false,
        allow_rebase_merge: false,
        allow_update_branch: true,
        delete_branch_on_merge: true,

        merge_commit_title: "MERGE_MESSAGE".to_string(),
        merge_commit_message: "PR_TITLE".to_string(),
        squash_merge_commit_title: "PR_TITLE".to_string(),
        squash_merge_commit_message: "COMMIT_MESSAGES".to_string(),

        web_commit_signoff_required: false,

        homepage: manifest.homepage().map_or_else(
            || format!("https://github.com/{}/{}#readme", repo.owner, repo.repo),
            ToString::to_string,
        ),
        description: manifest.description().map_or_else(
            || format!("Another great project by @{}.", info.owner.login),
            ToString::to_string,
        ),
        is_template: manifest.is_template(),
    }
}

fn branch_protection() -> BranchProtection {
    BranchProtection {
        lock_branch: false,
        block_creations: true,
        allow_deletions: false,
        allow_fork_syncing: false,
        allow_force_pushes: false,

        required_signatures: true,
        required_linear_history: true,
        required_conversation_resolution: true,
        required_status_checks: None,

        restrictions: Some(Actors::teams(&["owners"])),
        required_pull_request_reviews: Some(PullRequestReviews {
            dismiss_stale_reviews: true,
            require_code_owner_reviews: true,
            required_approving_review_count: 1,
            require_last_push_approval: true,
            dismissal_restrictions: Actors::teams(&["owners"]),
            bypass_pull_request_allowances: Actors::teams(&["owners"]),
        }),
        enforce_admins: false,
    }
}

// ============================================================================
// Mutators
// ============================================================================

struct LabelMutator<'a> {
    client: &'a GitHubClient,
    repo: &'a RepoRef,
    actual: &'a BTreeMap<String, Label>,
}

impl Mutator<LabelSpec> for LabelMutator<'_> {
    fn resource_type(&self) -> &'static str {
        "label"
    }

    fn describe(&self, op: &Operation<'_, LabelSpec>) -> String {
        match op {
            Operation::Create { name, attrs } => format!(
                "Adding `{name}` label to GitHub repo with `#{}` color.",
                attrs.color
            ),
            Operation::Update { name, attrs } => format!(
                "Updating `{name}` label in GitHub repo to `#{}` color.",
                attrs.color
            ),
            Operation::Delete { name } => match self.actual.get(*name) {
                Some(label) => format!(
                    "Deleting `{name}` (unused) label with `#{}` color from GitHub repo.",
                    label.color
                ),
                None => format!("Deleting `{name}` (unused) label from GitHub repo."),
            },
        }
    }

    fn create(&mut self, name: &str, attrs: &LabelSpec) -> Result<()> {
        Ok(self.client.create_label(self.repo, name, attrs)?)
    }

    fn update(&mut self, name: &str, attrs: &LabelSpec) -> Result<()> {
        Ok(self.client.update_label(self.repo, name, attrs)?)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        Ok(self.client.delete_label(self.repo, name)?)
    }
}

/// Repo team access; teams belong to the repo owner's org.
struct TeamMutator<'a> {
    client: &'a GitHubClient,
    repo: &'a RepoRef,
    actual: &'a BTreeMap<String, Team>,
}

impl Mutator<String> for TeamMutator<'_> {
    fn resource_type(&self) -> &'static str {
        "team"
    }

    fn describe(&self, op: &Operation<'_, String>) -> String {
        match op {
            Operation::Create { name, attrs } | Operation::Update { name, attrs } => {
                format!("Adding `{name}` team to GitHub repo with `{attrs}` permission.")
            }
            Operation::Delete { name } => {
                let permission = self.actual.get(*name).map_or("", |t| t.permission.as_str());
                format!("Deleting `{name}` (unused) team with `{permission}` permission from GitHub repo.")
            }
        }
    }

    fn create(&mut self, name: &str, permission: &String) -> Result<()> {
        Ok(self
            .client
            .add_team(&self.repo.owner, name, self.repo, permission)?)
    }

    fn update(&mut self, name: &str, permission: &String) -> Result<()> {
        self.create(name, permission)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        Ok(self.client.remove_team(&self.repo.owner, name, self.repo)?)
    }
}

struct BranchMutator<'a> {
    client: &'a GitHubClient,
    repo: &'a RepoRef,
}

impl Mutator<BranchProtection> for BranchMutator<'_> {
    fn resource_type(&self) -> &'static str {
        "branch protection"
    }

    fn describe(&self, op: &Operation<'_, BranchProtection>) -> String {
        match op {
            Operation::Create { name, .. } | Operation::Update { name, .. } => {
                format!("Protecting `{name}` branch in GitHub repo.")
            }
            Operation::Delete { name } => {
                format!("Deleting `{name}` (unused) branch protection in GitHub repo.")
            }
        }
    }

    fn create(&mut self, name: &str, protection: &BranchProtection) -> Result<()> {
        Ok(self.client.protect_branch(self.repo, name, protection)?)
    }

    fn update(&mut self, name: &str, protection: &BranchProtection) -> Result<()> {
        self.create(name, protection)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        Ok(self.client.unprotect_branch(self.repo, name)?)
    }
}
