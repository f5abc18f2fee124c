//! Deployment environments, their branch policies and their secrets.

use crate::client::{GitHubClient, Method, repo_path, seg};
use crate::error::Result;
use crate::pages::Pages;
use crate::types::{
    BranchPolicy, EncryptedSecret, Environment, EnvironmentSettings, PublicKey, RepoRef, Secret,
};
use serde::Serialize;

#[derive(Serialize)]
struct NewBranchPolicy<'a> {
    name: &'a str,
}

fn env_path(repo: &RepoRef, env: &str) -> String {
    format!("{}/environments/{}", repo_path(repo), seg(env))
}

/// Secrets are addressed by repository id, not by `owner/repo`.
fn env_secrets_path(repo_id: u64, env: &str) -> String {
    format!("/repositories/{repo_id}/environments/{}/secrets", seg(env))
}

impl GitHubClient {
    /// List deployment environments.
    pub fn environments(&self, repo: &RepoRef) -> Pages<'_, Environment> {
        self.paginate(&format!("{}/environments", repo_path(repo)), Some("environments"))
    }

    /// Create or update an environment.
    pub fn upsert_environment(
        &self,
        repo: &RepoRef,
        env: &str,
        settings: &EnvironmentSettings,
    ) -> Result<()> {
        self.send_json(Method::Put, &env_path(repo, env), settings)?;
        Ok(())
    }

    pub fn delete_environment(&self, repo: &RepoRef, env: &str) -> Result<()> {
        self.delete(&env_path(repo, env))
    }

    // -------------------------------------------------------------------------
    // Deployment branch policies
    // -------------------------------------------------------------------------

    pub fn branch_policies(&self, repo: &RepoRef, env: &str) -> Pages<'_, BranchPolicy> {
        self.paginate(
            &format!("{}/deployment-branch-policies", env_path(repo, env)),
            Some("branch_policies"),
        )
    }

    pub fn create_branch_policy(&self, repo: &RepoRef, env: &str, branch: &str) -> Result<()> {
        let path = format!("{}/deployment-branch-policies", env_path(repo, env));
        self.send_json(Method::Post, &path, &NewBranchPolicy { name: branch })?;
        Ok(())
    }

    /// Delete a branch policy by its numeric id.
    pub fn delete_branch_policy(&self, repo: &RepoRef, env: &str, policy_id: u64) -> Result<()> {
        self.delete(&format!(
            "{}/deployment-branch-policies/{policy_id}",
            env_path(repo, env)
        ))
    }

    // -------------------------------------------------------------------------
    // Environment secrets
    // -------------------------------------------------------------------------

    pub fn environment_secrets(&self, repo_id: u64, env: &str) -> Pages<'_, Secret> {
        self.paginate(&env_secrets_path(repo_id, env), Some("secrets"))
    }

    /// Public key used to seal values for `env`.
    pub fn environment_public_key(&self, repo_id: u64, env: &str) -> Result<PublicKey> {
        self.get_json(&format!("{}/public-key", env_secrets_path(repo_id, env)))
    }

    /// Create or update a sealed secret.
    pub fn put_environment_secret(
        &self,
        repo_id: u64,
        env: &str,
        name: &str,
        secret: &EncryptedSecret,
    ) -> Result<()> {
        let path = format!("{}/{}", env_secrets_path(repo_id, env), seg(name));
        self.send_json(Method::Put, &path, secret)?;
        Ok(())
    }

    pub fn delete_environment_secret(&self, repo_id: u64, env: &str, name: &str) -> Result<()> {
        self.delete(&format!("{}/{}", env_secrets_path(repo_id, env), seg(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use mockito::Matcher;

    fn repo() -> RepoRef {
        RepoRef::new("acme", "skeleton")
    }

    #[test]
    fn test_environments_unwrap_envelope() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/repos/acme/skeleton/environments")
            .match_query(Matcher::Any)
            .with_body(r#"{"total_count": 2, "environments": [{"name": "dev", "id": 1}, {"name": "prod", "id": 2}]}"#)
            .create();

        let client = GitHubClient::with_api_base(server.url(), None);
        let pages: Vec<Vec<Environment>> = client
            .environments(&repo())
            .collect::<Result<_>>()
            .unwrap();

        let names: Vec<_> = pages.concat().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["dev", "prod"]);
    }

    #[test]
    fn test_environments_missing_envelope_is_invalid() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/repos/acme/skeleton/environments")
            .match_query(Matcher::Any)
            .with_body(r#"{"total_count": 0}"#)
            .create();

        let client = GitHubClient::with_api_base(server.url(), None);
        let first = client.environments(&repo()).next().unwrap();
        assert!(matches!(first, Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn test_upsert_environment_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/repos/acme/skeleton/environments/prod")
            .match_body(Matcher::JsonString(
                r#"{"deployment_branch_policy": {"protected_branches": false, "custom_branch_policies": true}}"#
                    .to_string(),
            ))
            .with_body("{}")
            .create();

        let client = GitHubClient::with_api_base(server.url(), None);
        client
            .upsert_environment(&repo(), "prod", &EnvironmentSettings::custom_branch_policies())
            .unwrap();
        mock.assert();
    }

    #[test]
    fn test_delete_branch_policy_by_id() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock(
                "DELETE",
                "/repos/acme/skeleton/environments/prod/deployment-branch-policies/77",
            )
            .with_status(204)
            .create();

        let client = GitHubClient::with_api_base(server.url(), None);
        client.delete_branch_policy(&repo(), "prod", 77).unwrap();
        mock.assert();
    }

    #[test]
    fn test_secret_paths_use_repository_id() {
        let mut server = mockito::Server::new();
        let key = server
            .mock("GET", "/repositories/42/environments/ci/secrets/public-key")
            .with_body(r#"{"key_id": "k1", "key": "AAAA"}"#)
            .create();
        let put = server
            .mock("PUT", "/repositories/42/environments/ci/secrets/USER_DOTENV_KEY_CI")
            .match_body(Matcher::JsonString(
                r#"{"encrypted_value": "c2VhbGVk", "key_id": "k1"}"#.to_string(),
            ))
            .with_status(201)
            .create();

        let client = GitHubClient::with_api_base(server.url(), None);
        let public_key = client.environment_public_key(42, "ci").unwrap();
        client
            .put_environment_secret(
                42,
                "ci",
                "USER_DOTENV_KEY_CI",
                &EncryptedSecret {
                    encrypted_value: "c2VhbGVk".to_string(),
                    key_id: public_key.key_id,
                },
            )
            .unwrap();

        key.assert();
        put.assert();
    }
}
