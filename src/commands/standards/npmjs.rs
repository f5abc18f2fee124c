//! Team access to the npm package (`standards npmjs`).

use anyhow::{Context, Result};
use declarative::{Mutator, Operation, composite, merge_baseline, reconcile};
use npmkit::{PackageOrigin, Permission};
use std::collections::BTreeMap;

use super::{is_current, record};
use crate::Context as AppContext;
use crate::config::{GITHUB_CONFIG_VERSION, NPMJS_CONFIG_VERSION, keys};
use crate::manifest::Manifest;
use crate::ui;

pub fn run(ctx: &AppContext, dry_run: bool) -> Result<()> {
    let mut manifest = Manifest::load(&ctx.settings.package_json())?;
    configure(ctx, &ctx.settings.npm(), &mut manifest, dry_run)
}

/// Grant the org's teams access to the package and revoke the rest.
///
/// Returns quietly unless the package is scoped to the org and the npm user
/// administers that org.
pub fn configure(
    ctx: &AppContext,
    npm: &npmkit::Client,
    manifest: &mut Manifest,
    dry_run: bool,
) -> Result<()> {
    let scope = ctx.settings.npm_scope();
    let origin: PackageOrigin = manifest.name().parse()?;
    if !origin.is_in_org(&scope) {
        log::debug!("{origin} is not an `{scope}` package");
        return Ok(());
    }
    if !npm.can_admin_org(&scope)? {
        log::debug!("npm user does not administer `{scope}`");
        return Ok(());
    }

    // Team baseline overlaps the GitHub standards, so both versions count.
    let version = composite(&[GITHUB_CONFIG_VERSION, NPMJS_CONFIG_VERSION]);
    if is_current(manifest, keys::NPMJS_CONFIG_VERSIONS, &version) {
        ctx.step(&format!("npm package configuration is up-to-date @v{version}."));
        return Ok(());
    }
    ctx.step("Configuring npm package using org-wide standards.");

    let desired = desired_teams(manifest)?;
    let actual = npm
        .org_teams(&scope)
        .with_context(|| format!("Failed to list `{scope}` teams"))?;

    let mut mutator = TeamAccessMutator {
        npm,
        scope: &scope,
    };
    reconcile(&desired, &actual, &[], &mut mutator, &mut ctx.reporter(), dry_run)?;

    record(manifest, keys::NPMJS_CONFIG_VERSIONS, &version, dry_run)
}

fn baseline_teams() -> BTreeMap<String, Permission> {
    BTreeMap::from([
        ("developers".to_string(), Permission::ReadWrite),
        ("owners".to_string(), Permission::ReadWrite),
        ("security-managers".to_string(), Permission::ReadOnly),
    ])
}

/// `npmjs.teams`, falling back to `github.teams`, under the baseline.
pub(crate) fn desired_teams(manifest: &Manifest) -> Result<BTreeMap<String, Permission>> {
    let path = if manifest.get(keys::NPMJS_TEAMS).is_some() {
        keys::NPMJS_TEAMS
    } else {
        keys::GITHUB_TEAMS
    };
    let custom: BTreeMap<String, String> = match manifest.get(path) {
        None => BTreeMap::new(),
        Some(value) => serde_json::from_value(value.clone())
            .with_context(|| format!("Invalid `{}` in package.json", path.join(".")))?,
    };
    let custom = custom
        .into_iter()
        .map(|(team, permission)| (team, Permission::normalize(&permission)))
        .collect();
    Ok(merge_baseline(&baseline_teams(), &custom))
}

struct TeamAccessMutator<'a> {
    npm: &'a npmkit::Client,
    scope: &'a str,
}

impl Mutator<Permission> for TeamAccessMutator<'_> {
    fn resource_type(&self) -> &'static str {
        "npm team"
    }

    fn describe(&self, op: &Operation<'_, Permission>) -> String {
        match op {
            Operation::Create { name, attrs } | Operation::Update { name, attrs } => {
                format!("Granting `{name}` team `{attrs}` access to npm package.")
            }
            Operation::Delete { name } => {
                format!("Revoking `{name}` (unused) team access to npm package.")
            }
        }
    }

    fn create(&mut self, name: &str, permission: &Permission) -> Result<()> {
        Ok(self.npm.grant_team(self.scope, name, *permission)?)
    }

    fn update(&mut self, name: &str, permission: &Permission) -> Result<()> {
        self.create(name, permission)
    }

    /// A team that never had access makes npm fail; that is not an error here.
    fn delete(&mut self, name: &str) -> Result<()> {
        if let Err(err) = self.npm.revoke_team(self.scope, name) {
            ui::warn(&format!("Could not revoke `{name}` team access: {err}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::write_manifest;
    use super::*;
    use crate::config::test_settings;
    use npmkit::backend::mock::{MockBackend, OrgAccess};

    fn context(dir: &std::path::Path) -> AppContext {
        AppContext {
            quiet: true,
            settings: test_settings(dir),
        }
    }

    fn npm(mock: &MockBackend) -> npmkit::Client {
        npmkit::Client::with_backend(Box::new(mock.clone()))
    }

    #[test]
    fn test_desired_teams_prefers_npmjs_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"{"config": {"c10n": {"&": {
                "github": {"teams": {"designers": "push"}},
                "npmjs": {"teams": {"owners": "read-only", "docs": "pull", "ops": "maintain"}}
            }}}}"#,
        );
        let teams = desired_teams(&Manifest::load(&path).unwrap()).unwrap();

        assert_eq!(teams.len(), 5);
        assert_eq!(teams["owners"], Permission::ReadWrite);
        assert_eq!(teams["docs"], Permission::ReadOnly);
        assert_eq!(teams["ops"], Permission::ReadWrite);
        assert!(!teams.contains_key("designers"));
    }

    #[test]
    fn test_desired_teams_falls_back_to_github() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"{"config": {"c10n": {"&": {"github": {"teams": {"designers": "admin"}}}}}}"#,
        );
        let teams = desired_teams(&Manifest::load(&path).unwrap()).unwrap();
        assert_eq!(teams["designers"], Permission::ReadWrite);
        assert_eq!(teams["security-managers"], Permission::ReadOnly);
    }

    #[test]
    fn test_configure_grants_and_revokes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), r#"{"name": "@acme/app"}"#);
        let mut manifest = Manifest::load(&path).unwrap();
        let mock = MockBackend::new().with_teams(&["@acme:owners", "@acme:legacy"]);

        configure(&context(dir.path()), &npm(&mock), &mut manifest, false).unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                "grant read-write @acme:developers",
                "grant read-only @acme:security-managers",
                "grant read-write @acme:owners",
                "revoke @acme:legacy",
            ]
        );
        assert_eq!(
            Manifest::load(&path).unwrap().get_str(keys::NPMJS_CONFIG_VERSIONS),
            Some("1.0.1,1.0.0")
        );
    }

    #[test]
    fn test_revoke_failure_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), r#"{"name": "@acme/app"}"#);
        let mut manifest = Manifest::load(&path).unwrap();
        let mock = MockBackend::new()
            .with_teams(&["@acme:legacy"])
            .failing_revoke();

        configure(&context(dir.path()), &npm(&mock), &mut manifest, false).unwrap();
        assert!(mock.calls().contains(&"revoke @acme:legacy".to_string()));
        assert!(Manifest::load(&path).unwrap().get(keys::NPMJS_CONFIG_VERSIONS).is_some());
    }

    #[test]
    fn test_failed_grant_leaves_version_unrecorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), r#"{"name": "@acme/app"}"#);
        let mock = MockBackend::new().failing_grant();

        let result = configure(&context(dir.path()), &npm(&mock), &mut Manifest::load(&path).unwrap(), false);
        assert!(result.is_err());
        assert_eq!(mock.calls(), vec!["grant read-write @acme:developers"]);
        assert!(Manifest::load(&path).unwrap().get(keys::NPMJS_CONFIG_VERSIONS).is_none());

        let mock = MockBackend::new();
        configure(&context(dir.path()), &npm(&mock), &mut Manifest::load(&path).unwrap(), false)
            .unwrap();
        assert_eq!(mock.calls().len(), 3);
        assert_eq!(
            Manifest::load(&path).unwrap().get_str(keys::NPMJS_CONFIG_VERSIONS),
            Some("1.0.1,1.0.0")
        );
    }

    #[test]
    fn test_dry_run_calls_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), r#"{"name": "@acme/app"}"#);
        let mut manifest = Manifest::load(&path).unwrap();
        let mock = MockBackend::new().with_teams(&["@acme:legacy"]);

        configure(&context(dir.path()), &npm(&mock), &mut manifest, true).unwrap();
        assert!(mock.calls().is_empty());
        assert!(Manifest::load(&path).unwrap().get(keys::NPMJS_CONFIG_VERSIONS).is_none());
    }

    #[test]
    fn test_gates() {
        let dir = tempfile::tempdir().unwrap();

        // Foreign scope.
        let path = write_manifest(dir.path(), r#"{"name": "@other/app"}"#);
        let mock = MockBackend::new();
        configure(&context(dir.path()), &npm(&mock), &mut Manifest::load(&path).unwrap(), false)
            .unwrap();
        assert!(mock.calls().is_empty());

        // Not an org admin.
        let path = write_manifest(dir.path(), r#"{"name": "@acme/app"}"#);
        let mock = MockBackend::new().with_access(OrgAccess::Denied);
        configure(&context(dir.path()), &npm(&mock), &mut Manifest::load(&path).unwrap(), false)
            .unwrap();
        assert!(mock.calls().is_empty());

        // Unrelated npm failure.
        let mock = MockBackend::new().with_access(OrgAccess::Broken);
        assert!(
            configure(&context(dir.path()), &npm(&mock), &mut Manifest::load(&path).unwrap(), false)
                .is_err()
        );
    }

    #[test]
    fn test_current_version_skips() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(
            dir.path(),
            r#"{"name": "@acme/app", "config": {"c10n": {"&": {"npmjs": {"configVersions": "1.0.1,1.0.0"}}}}}"#,
        );
        let mock = MockBackend::new().with_teams(&["@acme:legacy"]);
        configure(&context(dir.path()), &npm(&mock), &mut Manifest::load(&path).unwrap(), false)
            .unwrap();
        assert!(mock.calls().is_empty());
    }
}
