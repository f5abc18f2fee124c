//! Version markers gating whether a reconciliation pass runs at all

/// Check whether a pass can be skipped
///
/// True only when the persisted marker equals the declared version exactly.
/// A missing marker never matches.
pub fn should_skip(current_marker: Option<&str>, declared_version: &str) -> bool {
    current_marker == Some(declared_version)
}

/// Join several declaration versions into one composite marker
///
/// Used when a pass depends on more than one declaration, e.g. `"1.0.1,1.0.0"`.
pub fn composite(versions: &[&str]) -> String {
    versions.join(",")
}
