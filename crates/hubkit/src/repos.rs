//! Repository-level endpoints: settings, labels, teams and branch protection.

use crate::client::{GitHubClient, Method, repo_path, seg};
use crate::error::Result;
use crate::pages::Pages;
use crate::types::{Branch, BranchProtection, Label, LabelSpec, RepoRef, RepoSettings, Repository, Team};
use serde::Serialize;

#[derive(Serialize)]
struct LabelBody<'a> {
    name: &'a str,
    color: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct TeamPermission<'a> {
    permission: &'a str,
}

impl GitHubClient {
    /// Fetch repository metadata.
    pub fn repository(&self, repo: &RepoRef) -> Result<Repository> {
        self.get_json(&repo_path(repo))
    }

    /// Apply repository settings.
    pub fn update_repository(&self, repo: &RepoRef, settings: &RepoSettings) -> Result<()> {
        self.send_json(Method::Patch, &repo_path(repo), settings)?;
        Ok(())
    }

    /// Enable Dependabot vulnerability alerts.
    pub fn enable_vulnerability_alerts(&self, repo: &RepoRef) -> Result<()> {
        self.put_empty(&format!("{}/vulnerability-alerts", repo_path(repo)))
    }

    /// Enable Dependabot automated security fixes.
    pub fn enable_automated_security_fixes(&self, repo: &RepoRef) -> Result<()> {
        self.put_empty(&format!("{}/automated-security-fixes", repo_path(repo)))
    }

    // -------------------------------------------------------------------------
    // Labels
    // -------------------------------------------------------------------------

    /// List labels, one page at a time.
    pub fn labels(&self, repo: &RepoRef) -> Pages<'_, Label> {
        self.paginate(&format!("{}/labels", repo_path(repo)), None)
    }

    pub fn create_label(&self, repo: &RepoRef, name: &str, spec: &LabelSpec) -> Result<()> {
        let body = LabelBody {
            name,
            color: &spec.color,
            description: &spec.description,
        };
        self.send_json(Method::Post, &format!("{}/labels", repo_path(repo)), &body)?;
        Ok(())
    }

    pub fn update_label(&self, repo: &RepoRef, name: &str, spec: &LabelSpec) -> Result<()> {
        let body = LabelBody {
            name,
            color: &spec.color,
            description: &spec.description,
        };
        let path = format!("{}/labels/{}", repo_path(repo), seg(name));
        self.send_json(Method::Patch, &path, &body)?;
        Ok(())
    }

    pub fn delete_label(&self, repo: &RepoRef, name: &str) -> Result<()> {
        self.delete(&format!("{}/labels/{}", repo_path(repo), seg(name)))
    }

    // -------------------------------------------------------------------------
    // Teams
    // -------------------------------------------------------------------------

    /// List teams with access to the repository.
    pub fn repo_teams(&self, repo: &RepoRef) -> Pages<'_, Team> {
        self.paginate(&format!("{}/teams", repo_path(repo)), None)
    }

    /// Grant (or change) a team's permission on the repository.
    pub fn add_team(&self, org: &str, team: &str, repo: &RepoRef, permission: &str) -> Result<()> {
        let path = team_repo_path(org, team, repo);
        self.send_json(Method::Put, &path, &TeamPermission { permission })?;
        Ok(())
    }

    /// Revoke a team's access to the repository.
    pub fn remove_team(&self, org: &str, team: &str, repo: &RepoRef) -> Result<()> {
        self.delete(&team_repo_path(org, team, repo))
    }

    // -------------------------------------------------------------------------
    // Branch protection
    // -------------------------------------------------------------------------

    /// List protected branches only.
    pub fn protected_branches(&self, repo: &RepoRef) -> Pages<'_, Branch> {
        self.paginate(&format!("{}/branches?protected=true", repo_path(repo)), None)
    }

    pub fn protect_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
        protection: &BranchProtection,
    ) -> Result<()> {
        let path = format!("{}/branches/{}/protection", repo_path(repo), seg(branch));
        self.send_json(Method::Put, &path, protection)?;
        Ok(())
    }

    pub fn unprotect_branch(&self, repo: &RepoRef, branch: &str) -> Result<()> {
        self.delete(&format!("{}/branches/{}/protection", repo_path(repo), seg(branch)))
    }
}

/// `/orgs/{org}/teams/{team}/repos/{owner}/{repo}`
fn team_repo_path(org: &str, team: &str, repo: &RepoRef) -> String {
    format!(
        "/orgs/{}/teams/{}/repos/{}/{}",
        seg(org),
        seg(team),
        seg(&repo.owner),
        seg(&repo.repo)
    )
}
