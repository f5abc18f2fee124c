//! Error type for apply passes

use crate::types::OperationKind;
use thiserror::Error;

/// An apply pass aborted on a failing remote call
///
/// Operations before the failing one have already been applied; the remote
/// may be partially converged. Running the pass again completes it.
#[derive(Debug, Error)]
#[error("failed to {kind} {resource_type} `{name}` ({completed} change(s) applied before the failure)")]
pub struct ApplyError {
    pub kind: OperationKind,
    pub resource_type: String,
    pub name: String,
    /// Number of operations that succeeded before the failure
    pub completed: usize,
    #[source]
    pub source: anyhow::Error,
}
