//! Deployment environments, branch policies and env secrets
//! (`standards envs`).

use anyhow::{Context, Result, bail};
use declarative::{ApplyObserver, ApplySummary, Mutator, Operation, fold_pages, reconcile};
use hubkit::{
    BranchPolicy, EncryptedSecret, Environment, EnvironmentSettings, GitHubClient, PublicKey,
    RepoRef, Secret, seal_secret,
};
use std::collections::BTreeMap;

use super::{admin_repo, is_current, origin, record};
use crate::Context as AppContext;
use crate::config::{GITHUB_ENVS_VERSION, keys};
use crate::manifest::Manifest;
use crate::vault::{EnvName, Vault};

pub fn run(ctx: &AppContext, dry_run: bool) -> Result<()> {
    let repo = origin(ctx)?;
    let mut manifest = Manifest::load(&ctx.settings.package_json())?;
    let vault = Vault::new(ctx.runner());
    configure(
        ctx,
        &ctx.settings.github(),
        &repo,
        &mut manifest,
        || vault.keys(),
        dry_run,
    )
}

/// Converge the repo's deployment environments and their secrets.
///
/// `env_keys` is only called once the repo is known to need configuring.
pub fn configure<F>(
    ctx: &AppContext,
    client: &GitHubClient,
    repo: &RepoRef,
    manifest: &mut Manifest,
    env_keys: F,
    dry_run: bool,
) -> Result<()>
where
    F: FnOnce() -> Result<BTreeMap<EnvName, String>>,
{
    let Some(info) = admin_repo(client, repo, &ctx.settings.org)? else {
        return Ok(());
    };
    if is_current(manifest, keys::GITHUB_ENVS_VERSION, GITHUB_ENVS_VERSION) {
        ctx.step(&format!(
            "GitHub repo environments are up-to-date @v{GITHUB_ENVS_VERSION}."
        ));
        return Ok(());
    }
    ctx.step("Configuring GitHub repo environments using org-wide standards.");

    let env_keys = env_keys()?;
    let mut observer = ctx.reporter();

    let desired: BTreeMap<String, EnvironmentSettings> = EnvName::DEPLOYABLE
        .iter()
        .map(|env| (env.to_string(), EnvironmentSettings::custom_branch_policies()))
        .collect();
    let existing = fold_pages(client.environments(repo), |e: &Environment| e.name.clone())
        .context("Failed to list GitHub repo environments")?;
    reconcile(
        &desired,
        &existing,
        &[],
        &mut EnvMutator { client, repo },
        &mut observer,
        dry_run,
    )?;

    if !dry_run {
        for env in EnvName::DEPLOYABLE {
            converge_branch_policies(client, repo, env, &mut observer)?;
        }
    }

    let main_key = key_of(&env_keys, EnvName::Main)?;
    for env in EnvName::DEPLOYABLE {
        let secrets = BTreeMap::from([
            (EnvName::Main.secret_name(), main_key.to_string()),
            (env.secret_name(), key_of(&env_keys, env)?.to_string()),
        ]);
        // A dry run never created the env, so there is nothing to list yet.
        let actual = if dry_run && !existing.contains_key(env.as_str()) {
            BTreeMap::new()
        } else {
            fold_pages(client.environment_secrets(info.id, env.as_str()), |s: &Secret| {
                s.name.clone()
            })
            .with_context(|| format!("Failed to list secrets of `{env}` repo env"))?
        };
        let mut mutator = SecretMutator {
            client,
            repo_id: info.id,
            env,
            public_key: None,
        };
        reconcile(&secrets, &actual, &[], &mut mutator, &mut observer, dry_run)?;
    }

    record(manifest, keys::GITHUB_ENVS_VERSION, GITHUB_ENVS_VERSION, dry_run)
}

/// Converge the deployment branch policies of `env`. Policies that already
/// exist carry nothing to update, so they are kept rather than rewritten.
fn converge_branch_policies<O>(
    client: &GitHubClient,
    repo: &RepoRef,
    env: EnvName,
    observer: &mut O,
) -> Result<ApplySummary>
where
    O: ApplyObserver + ?Sized,
{
    let actual = fold_pages(client.branch_policies(repo, env.as_str()), |p: &BranchPolicy| {
        p.name.clone()
    })
    .with_context(|| format!("Failed to list branch policies of `{env}` repo env"))?;

    let (existing, missing): (Vec<&str>, Vec<&str>) = branch_policies_for(env)
        .iter()
        .copied()
        .partition(|branch| actual.contains_key(*branch));
    let policies: BTreeMap<String, ()> = missing
        .into_iter()
        .map(|branch| (branch.to_string(), ()))
        .collect();

    let mut mutator = BranchPolicyMutator {
        client,
        repo,
        env,
        actual: &actual,
    };
    Ok(reconcile(&policies, &actual, &existing, &mut mutator, observer, false)?)
}

/// Branches allowed to deploy to `env`.
fn branch_policies_for(env: EnvName) -> &'static [&'static str] {
    match env {
        EnvName::Prod => &["main"],
        _ => &[],
    }
}

fn key_of(keys: &BTreeMap<EnvName, String>, env: EnvName) -> Result<&str> {
    keys.get(&env)
        .map(String::as_str)
        .with_context(|| format!("Missing Dotenv Vault key for `{env}` env"))
}

// ============================================================================
// Mutators
// ============================================================================

struct EnvMutator<'a> {
    client: &'a GitHubClient,
    repo: &'a RepoRef,
}

impl Mutator<EnvironmentSettings> for EnvMutator<'_> {
    fn resource_type(&self) -> &'static str {
        "repo env"
    }

    fn describe(&self, op: &Operation<'_, EnvironmentSettings>) -> String {
        match op {
            Operation::Create { name, .. } => format!("Creating `{name}` repo env at GitHub."),
            Operation::Update { name, .. } => format!("Updating `{name}` repo env at GitHub."),
            Operation::Delete { name } => {
                format!("Deleting `{name}` (unused) repo env at GitHub.")
            }
        }
    }

    fn create(&mut self, name: &str, settings: &EnvironmentSettings) -> Result<()> {
        Ok(self.client.upsert_environment(self.repo, name, settings)?)
    }

    fn update(&mut self, name: &str, settings: &EnvironmentSettings) -> Result<()> {
        self.create(name, settings)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        Ok(self.client.delete_environment(self.repo, name)?)
    }
}

/// Deployment branch policies of one env. Policies carry no attributes, so
/// updating one is a no-op.
struct BranchPolicyMutator<'a> {
    client: &'a GitHubClient,
    repo: &'a RepoRef,
    env: EnvName,
    actual: &'a BTreeMap<String, BranchPolicy>,
}

impl Mutator<()> for BranchPolicyMutator<'_> {
    fn resource_type(&self) -> &'static str {
        "branch policy"
    }

    fn describe(&self, op: &Operation<'_, ()>) -> String {
        let env = self.env;
        match op {
            Operation::Create { name, .. } => {
                format!("Creating `{name}` branch policy for `{env}` repo env at GitHub.")
            }
            Operation::Update { name, .. } => {
                format!("Updating `{name}` branch policy for `{env}` repo env at GitHub.")
            }
            Operation::Delete { name } => {
                format!("Deleting `{name}` (unused) branch policy for `{env}` repo env at GitHub.")
            }
        }
    }

    fn create(&mut self, name: &str, _: &()) -> Result<()> {
        Ok(self
            .client
            .create_branch_policy(self.repo, self.env.as_str(), name)?)
    }

    fn update(&mut self, _name: &str, _: &()) -> Result<()> {
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        let Some(policy) = self.actual.get(name) else {
            bail!("Unknown branch policy `{name}` in `{}` repo env", self.env);
        };
        Ok(self
            .client
            .delete_branch_policy(self.repo, self.env.as_str(), policy.id)?)
    }
}

/// Secrets of one env, sealed with the env's public key (fetched once).
struct SecretMutator<'a> {
    client: &'a GitHubClient,
    repo_id: u64,
    env: EnvName,
    public_key: Option<PublicKey>,
}

impl SecretMutator<'_> {
    fn public_key(&mut self) -> Result<&PublicKey> {
        if self.public_key.is_none() {
            let key = self
                .client
                .environment_public_key(self.repo_id, self.env.as_str())
                .with_context(|| format!("Failed to get public key of `{}` repo env", self.env))?;
            self.public_key = Some(key);
        }
        self.public_key
            .as_ref()
            .context("Public key unavailable")
    }
}

impl Mutator<String> for SecretMutator<'_> {
    fn resource_type(&self) -> &'static str {
        "secret"
    }

    fn describe(&self, op: &Operation<'_, String>) -> String {
        let env = self.env;
        match op {
            Operation::Create { name, .. } | Operation::Update { name, .. } => {
                format!("Updating `{name}` secret in `{env}` repo env at GitHub.")
            }
            Operation::Delete { name } => {
                format!("Deleting `{name}` (unused) secret in `{env}` repo env at GitHub.")
            }
        }
    }

    fn create(&mut self, name: &str, value: &String) -> Result<()> {
        let key = self.public_key()?;
        let secret = EncryptedSecret {
            encrypted_value: seal_secret(&key.key, value)?,
            key_id: key.key_id.clone(),
        };
        Ok(self
            .client
            .put_environment_secret(self.repo_id, self.env.as_str(), name, &secret)?)
    }

    fn update(&mut self, name: &str, value: &String) -> Result<()> {
        self.create(name, value)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        Ok(self
            .client
            .delete_environment_secret(self.repo_id, self.env.as_str(), name)?)
    }
}
