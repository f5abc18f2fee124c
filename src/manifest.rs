//! The project's `package.json`.
//!
//! Read once at the start of a pass and written once at the end. Key order is
//! preserved and the file is always written with 4-space indentation and a
//! trailing newline.

use anyhow::{Context, Result, bail};
use regex::RegexBuilder;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub struct Manifest {
    path: PathBuf,
    data: Map<String, Value>,
}

impl Manifest {
    /// Load and parse `package.json`; the document must be a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Unable to parse {}", path.display()))?;

        match value {
            Value::Object(data) => Ok(Self {
                path: path.to_path_buf(),
                data,
            }),
            _ => bail!("{} is not a JSON object", path.display()),
        }
    }

    /// Value at a nested key path.
    pub fn get(&self, keys: &[&str]) -> Option<&Value> {
        let (first, rest) = keys.split_first()?;
        rest.iter()
            .try_fold(self.data.get(*first)?, |value, key| value.get(*key))
    }

    pub fn get_str(&self, keys: &[&str]) -> Option<&str> {
        self.get(keys).and_then(Value::as_str)
    }

    /// Set a nested key path, creating (or replacing non-object) parents.
    pub fn set(&mut self, keys: &[&str], value: Value) {
        let Some((last, parents)) = keys.split_last() else {
            return;
        };

        let mut map = &mut self.data;
        for key in parents {
            let entry = map
                .entry((*key).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            map = match entry {
                Value::Object(next) => next,
                _ => return,
            };
        }
        map.insert((*last).to_string(), value);
    }

    // =========================================================================
    // Well-known fields
    // =========================================================================

    pub fn name(&self) -> &str {
        self.get_str(&["name"]).unwrap_or_default()
    }

    pub fn version(&self) -> &str {
        self.get_str(&["version"]).unwrap_or_default()
    }

    pub fn set_version(&mut self, version: &str) {
        self.set(&["version"], Value::String(version.to_string()));
    }

    /// `private: true` only; any other value counts as public.
    pub fn is_private(&self) -> bool {
        self.get(&["private"]).and_then(Value::as_bool) == Some(true)
    }

    /// Repository URL, from either `"repository": "<url>"` or `{ "url": ... }`.
    pub fn repository(&self) -> &str {
        match self.get(&["repository"]) {
            Some(Value::String(url)) => url,
            Some(Value::Object(repo)) => repo.get("url").and_then(Value::as_str).unwrap_or_default(),
            _ => "",
        }
    }

    pub fn homepage(&self) -> Option<&str> {
        self.get_str(&["homepage"]).filter(|s| !s.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.get_str(&["description"]).filter(|s| !s.is_empty())
    }

    /// Whether the repository URL points at `owner/repo`.
    pub fn is_repo(&self, owner_repo: &str) -> bool {
        RegexBuilder::new(&format!("[:/]{}(?:\\.git)?$", regex::escape(owner_repo)))
            .case_insensitive(true)
            .build()
            .is_ok_and(|re| re.is_match(self.repository()))
    }

    /// Whether this is a skeleton template repository.
    pub fn is_template(&self) -> bool {
        RegexBuilder::new(r"[:/][^/]+/skeleton(?:\.[^/]+)?(?:\.git)?$")
            .case_insensitive(true)
            .build()
            .is_ok_and(|re| re.is_match(self.repository()))
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    pub fn to_pretty_string(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.data.serialize(&mut serializer)?;
        let mut text = String::from_utf8(out).context("Manifest is not valid UTF-8")?;
        text.push('\n');
        Ok(text)
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.to_pretty_string()?)
            .with_context(|| format!("Could not write {}", self.path.display()))
    }
}

/// Rewrite `package.json` in the standard format.
pub fn prettify(path: &Path) -> Result<()> {
    Manifest::load(path)?.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("package.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_requires_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[1, 2]");
        assert!(Manifest::load(&path).is_err());
    }

    #[test]
    fn test_nested_get_and_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"name": "@acme/x", "config": {"c10n": {"&": {"github": {}}}}}"#);
        let mut manifest = Manifest::load(&path).unwrap();

        let key = &["config", "c10n", "&", "github", "configVersion"];
        assert_eq!(manifest.get(key), None);

        manifest.set(key, json!("1.0.1"));
        assert_eq!(manifest.get_str(key), Some("1.0.1"));

        manifest.set(&["config", "c10n", "&", "npmjs", "configVersions"], json!("1.0.1,1.0.0"));
        assert_eq!(
            manifest.get_str(&["config", "c10n", "&", "npmjs", "configVersions"]),
            Some("1.0.1,1.0.0")
        );
    }

    #[test]
    fn test_set_replaces_scalar_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"config": "oops"}"#);
        let mut manifest = Manifest::load(&path).unwrap();
        manifest.set(&["config", "a"], json!(1));
        assert_eq!(manifest.get(&["config", "a"]), Some(&json!(1)));
    }

    #[test]
    fn test_save_format_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"name":"x","version":"1.0.0","aaa":true}"#);
        let mut manifest = Manifest::load(&path).unwrap();
        manifest.set_version("1.0.1");
        manifest.save().unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert_eq!(
            saved,
            "{\n    \"name\": \"x\",\n    \"version\": \"1.0.1\",\n    \"aaa\": true\n}\n"
        );
    }

    #[test]
    fn test_repository_forms() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"repository": {"type": "git", "url": "https://github.com/acme/skeleton.git"}}"#);
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.repository(), "https://github.com/acme/skeleton.git");
        assert!(manifest.is_repo("acme/skeleton"));
        assert!(manifest.is_repo("ACME/Skeleton"));
        assert!(!manifest.is_repo("acme/skel"));
        assert!(manifest.is_template());
    }

    #[test]
    fn test_template_detection() {
        let dir = tempfile::tempdir().unwrap();
        for (repo, expected) in [
            ("git@github.com:acme/skeleton.git", true),
            ("https://github.com/acme/skeleton.x", true),
            ("https://github.com/acme/skeleton-fork", false),
            ("https://github.com/acme/app", false),
        ] {
            let path = write(dir.path(), &format!(r#"{{"repository": "{repo}"}}"#));
            assert_eq!(Manifest::load(&path).unwrap().is_template(), expected, "{repo}");
        }
    }

    #[test]
    fn test_private_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"private": "yes", "homepage": ""}"#);
        let manifest = Manifest::load(&path).unwrap();
        assert!(!manifest.is_private());
        assert_eq!(manifest.homepage(), None);
        assert_eq!(manifest.version(), "");
        assert_eq!(manifest.name(), "");
    }
}
