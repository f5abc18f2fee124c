//! Env files and the Dotenv Vault (`envs ...`).

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

use crate::Context as AppContext;
use crate::cli::{EnvsCommand, Mode};
use crate::commands::standards;
use crate::config::{Settings, is_interactive};
use crate::git::Git;
use crate::vault::{EnvName, Vault, env_of_key, env_to_string};

pub fn run(ctx: &AppContext, cmd: EnvsCommand) -> Result<()> {
    let vault = Vault::new(ctx.runner());
    match cmd {
        EnvsCommand::Push { dry_run } => {
            push(ctx, &vault, dry_run)?;
            let git = Git::new(ctx.runner());
            if git.is_repo() && git.has_github_origin() {
                standards::envs::run(ctx, dry_run)?;
            }
            Ok(())
        }
        EnvsCommand::Pull { dry_run } => pull(ctx, &vault, dry_run),
        EnvsCommand::Keys { dry_run } => show_keys(ctx, &vault, dry_run),
        EnvsCommand::Encrypt { dry_run } => encrypt(ctx, &vault, dry_run),
        EnvsCommand::Decrypt { keys, dry_run } => decrypt(ctx, &vault, &keys, dry_run),
        EnvsCommand::Install { mode, dry_run } => {
            if is_interactive() {
                pull(ctx, &vault, dry_run)
            } else {
                let keys = install_keys(&ctx.settings, mode)?;
                decrypt(ctx, &vault, &keys, dry_run)
            }
        }
    }
}

/// Push every env file (creating missing ones), then rebuild `.env.vault`.
fn push(ctx: &AppContext, vault: &Vault, dry_run: bool) -> Result<()> {
    let project_dir = &ctx.settings.project_dir;
    for env in EnvName::ALL {
        let file = env.file(project_dir);
        if !file.exists() {
            ctx.step(&format!("Creating file for `{env}` env."));
            if !dry_run {
                write_env_file(&file, &format!("# {env}\n"))?;
            }
        }
        ctx.step(&format!("Pushing `{env}` env to Dotenv Vault."));
        if !dry_run {
            vault.push(env, Path::new(env.relative_file()))?;
        }
    }
    encrypt(ctx, vault, dry_run)
}

fn show_keys(ctx: &AppContext, vault: &Vault, dry_run: bool) -> Result<()> {
    ctx.step("Getting all Dotenv Vault keys.");
    if dry_run {
        return Ok(());
    }
    vault.show_keys()
}

fn pull(ctx: &AppContext, vault: &Vault, dry_run: bool) -> Result<()> {
    let project_dir = &ctx.settings.project_dir;
    for env in EnvName::ALL {
        ctx.step(&format!("Pulling `{env}` env from Dotenv Vault."));
        if dry_run {
            continue;
        }
        let file = env.file(project_dir);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        vault.pull(env, Path::new(env.relative_file()))?;

        let previous = file.with_file_name(format!(
            "{}.previous",
            file.file_name().unwrap_or_default().to_string_lossy()
        ));
        if previous.exists() {
            fs::remove_file(&previous)
                .with_context(|| format!("Failed to remove {}", previous.display()))?;
        }
    }
    Ok(())
}

fn encrypt(ctx: &AppContext, vault: &Vault, dry_run: bool) -> Result<()> {
    ctx.step("Encrypting all envs using latest Dotenv Vault data.");
    if !dry_run {
        vault.build()?;
    }
    Ok(())
}

/// Decrypt the env each key unlocks into its env file.
fn decrypt(ctx: &AppContext, vault: &Vault, keys: &[String], dry_run: bool) -> Result<()> {
    if !ctx.settings.env_vault().exists() {
        bail!("There are no Dotenv Vault envs to decrypt");
    }
    // Resolve every key first so a bad one fails before anything is written.
    let targets = keys
        .iter()
        .map(|key| Ok((env_of_key(key)?, key.as_str())))
        .collect::<Result<Vec<_>>>()?;

    for (env, key) in targets {
        ctx.step(&format!("Decrypting `{env}` env using Dotenv Vault key."));
        if dry_run {
            continue;
        }
        let vars = vault
            .decrypt(key)
            .with_context(|| format!("Failed to decrypt `{env}` env"))?;
        write_env_file(&env.file(&ctx.settings.project_dir), &env_to_string(env, &vars))?;
    }
    Ok(())
}

/// Keys a non-interactive install needs: main plus the mode's env.
fn install_keys(settings: &Settings, mode: Mode) -> Result<Vec<String>> {
    let keys = &settings.dotenv_keys;
    let mode_key = match mode {
        Mode::Dev => &keys.dev,
        Mode::Ci => &keys.ci,
        Mode::Stage => &keys.stage,
        Mode::Prod => &keys.prod,
    };

    [(EnvName::Main, &keys.main), (mode.env(), mode_key)]
        .into_iter()
        .map(|(env, key)| {
            key.clone()
                .filter(|k| !k.is_empty())
                .with_context(|| format!("Missing `{}` environment variable", env.secret_name()))
        })
        .collect()
}

fn write_env_file(file: &Path, content: &str) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(file, content).with_context(|| format!("Failed to write {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;
    use crate::runner::Runner;

    fn context(dir: &Path) -> AppContext {
        AppContext {
            quiet: true,
            settings: test_settings(dir),
        }
    }

    fn key(env: &str) -> String {
        format!("dotenv://:key_abc@dotenv.org/vault/.env.vault?environment={env}")
    }

    #[test]
    fn test_install_keys_for_mode() {
        let mut settings = test_settings(Path::new("."));
        settings.dotenv_keys.main = Some(key("main"));
        settings.dotenv_keys.stage = Some(key("stage"));

        assert_eq!(
            install_keys(&settings, Mode::Stage).unwrap(),
            vec![key("main"), key("stage")]
        );
        let err = install_keys(&settings, Mode::Prod).unwrap_err();
        assert!(err.to_string().contains("USER_DOTENV_KEY_PROD"));

        settings.dotenv_keys.main = Some(String::new());
        let err = install_keys(&settings, Mode::Stage).unwrap_err();
        assert!(err.to_string().contains("USER_DOTENV_KEY_MAIN"));
    }

    #[test]
    fn test_decrypt_requires_vault() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::new(Runner::new(dir.path(), Vec::new()));
        let err = decrypt(&context(dir.path()), &vault, &[key("dev")], true).unwrap_err();
        assert!(err.to_string().contains("no Dotenv Vault envs"));
    }

    #[test]
    fn test_decrypt_rejects_unknown_env_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env.vault"), "").unwrap();
        let vault = Vault::new(Runner::new(dir.path(), Vec::new()));

        let err = decrypt(&context(dir.path()), &vault, &[key("dev"), key("qa")], false).unwrap_err();
        assert!(err.to_string().contains("Invalid Dotenv Vault decryption key"));
        assert!(!EnvName::Dev.file(dir.path()).exists());
    }

    #[test]
    fn test_push_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::new(Runner::new(dir.path(), Vec::new()));
        push(&context(dir.path()), &vault, true).unwrap();
        assert!(!dir.path().join("dev").exists());
    }

    #[cfg(unix)]
    mod with_fake_npx {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// A `npx` that logs its arguments and answers `decrypt` with two vars.
        fn fake_vault(project: &Path, bin: &Path) -> Vault {
            let script = bin.join("npx");
            fs::write(
                &script,
                "#!/bin/sh\n\
                 echo \"$*\" >> \"$NPX_LOG\"\n\
                 case \"$2\" in\n\
                 \x20 pull) printf 'OLD=1\\n' > \"$4\"; printf x > \"$4.previous\" ;;\n\
                 \x20 decrypt) printf 'API_URL=https://example.com\\nGREETING=\"hi there\"\\n' ;;\n\
                 esac\n",
            )
            .unwrap();
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

            let path = format!(
                "{}:{}",
                bin.display(),
                std::env::var("PATH").unwrap_or_default()
            );
            Vault::new(Runner::new(
                project,
                vec![
                    ("PATH".to_string(), path),
                    ("NPX_LOG".to_string(), bin.join("log").display().to_string()),
                ],
            ))
        }

        fn log(bin: &Path) -> Vec<String> {
            fs::read_to_string(bin.join("log"))
                .unwrap_or_default()
                .lines()
                .map(ToString::to_string)
                .collect()
        }

        #[test]
        fn test_push_creates_missing_files() {
            let project = tempfile::tempdir().unwrap();
            let bin = tempfile::tempdir().unwrap();
            let vault = fake_vault(project.path(), bin.path());

            push(&context(project.path()), &vault, false).unwrap();

            assert_eq!(
                fs::read_to_string(EnvName::Ci.file(project.path())).unwrap(),
                "# ci\n"
            );
            let calls = log(bin.path());
            assert_eq!(calls.len(), 6);
            assert_eq!(calls[0], "dotenv-vault push main dev/.envs/.env --yes");
            assert_eq!(calls[5], "dotenv-vault build --yes");
        }

        #[test]
        fn test_pull_removes_previous_files() {
            let project = tempfile::tempdir().unwrap();
            let bin = tempfile::tempdir().unwrap();
            let vault = fake_vault(project.path(), bin.path());

            pull(&context(project.path()), &vault, false).unwrap();

            let prod = EnvName::Prod.file(project.path());
            assert_eq!(fs::read_to_string(&prod).unwrap(), "OLD=1\n");
            assert!(!project.path().join("dev/.envs/.env.prod.previous").exists());
            assert_eq!(log(bin.path()).len(), 5);
        }

        #[test]
        fn test_keys_dry_run_spawns_nothing() {
            let project = tempfile::tempdir().unwrap();
            let bin = tempfile::tempdir().unwrap();
            let vault = fake_vault(project.path(), bin.path());

            show_keys(&context(project.path()), &vault, true).unwrap();
            assert!(log(bin.path()).is_empty());

            show_keys(&context(project.path()), &vault, false).unwrap();
            assert_eq!(log(bin.path()), vec!["dotenv-vault keys --yes"]);
        }

        #[test]
        fn test_decrypt_writes_env_file() {
            let project = tempfile::tempdir().unwrap();
            let bin = tempfile::tempdir().unwrap();
            fs::write(project.path().join(".env.vault"), "").unwrap();
            let vault = fake_vault(project.path(), bin.path());

            decrypt(&context(project.path()), &vault, &[key("stage")], false).unwrap();

            assert_eq!(
                fs::read_to_string(EnvName::Stage.file(project.path())).unwrap(),
                "# stage\nAPI_URL=\"https://example.com\"\nGREETING=\"hi there\"\n"
            );
        }
    }
}
