//! Package version increments.

use anyhow::{Context, Result, bail};
use semver::{BuildMetadata, Prerelease, Version};

/// Next version after `current`.
///
/// An empty version counts as `0.0.0`. A prerelease bumps its rightmost
/// numeric identifier (appending `.0` when there is none); a release bumps
/// the patch number. Build metadata is dropped.
pub fn increment(current: &str) -> Result<String> {
    let source = if current.is_empty() { "0.0.0" } else { current };
    let mut version = Version::parse(source)
        .with_context(|| format!("Not a semantic version: `{current}`"))?;

    if version.pre.is_empty() {
        version.patch = version
            .patch
            .checked_add(1)
            .with_context(|| format!("Patch number overflows: `{current}`"))?;
    } else {
        version.pre = next_prerelease(&version.pre)
            .with_context(|| format!("Failed to increment version: `{current}`"))?;
    }
    version.build = BuildMetadata::EMPTY;

    Ok(version.to_string())
}

fn next_prerelease(pre: &Prerelease) -> Result<Prerelease> {
    let mut parts: Vec<String> = pre.as_str().split('.').map(ToString::to_string).collect();

    let mut bumped = false;
    for part in parts.iter_mut().rev() {
        if let Ok(n) = part.parse::<u64>() {
            let Some(next) = n.checked_add(1) else {
                bail!("Prerelease identifier `{part}` overflows");
            };
            *part = next.to_string();
            bumped = true;
            break;
        }
    }
    if !bumped {
        parts.push("0".to_string());
    }

    Ok(Prerelease::new(&parts.join("."))?)
}

/// Whether `version` parses and carries a prerelease tag.
pub fn is_prerelease(version: &str) -> bool {
    Version::parse(version).is_ok_and(|v| !v.pre.is_empty())
}
