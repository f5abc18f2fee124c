//! Mutator and observer traits
//!
//! These traits keep the reconciler free of any knowledge about the remote
//! system being converged or the way actions are reported to the user.

use crate::types::{ApplySummary, Operation, OperationKind};
use anyhow::Result;

/// Remote mutations for one resource type
///
/// Each method is a single remote call. Errors are returned as-is; the
/// executor aborts the remaining plan on the first one.
pub trait Mutator<A> {
    /// Resource type name used in messages (e.g. "label", "team")
    fn resource_type(&self) -> &'static str;

    /// Human-readable description of an operation, logged before it runs
    fn describe(&self, op: &Operation<'_, A>) -> String {
        let verb = match op.kind() {
            OperationKind::Create => "Creating",
            OperationKind::Update => "Updating",
            OperationKind::Delete => "Deleting (unused)",
        };
        format!("{} `{}` {}.", verb, op.name(), self.resource_type())
    }

    fn create(&mut self, name: &str, attrs: &A) -> Result<()>;

    fn update(&mut self, name: &str, attrs: &A) -> Result<()>;

    fn delete(&mut self, name: &str) -> Result<()>;
}

/// Observer notified of every action in an apply pass
pub trait ApplyObserver {
    /// Called before an operation is invoked (or instead of it, in dry run)
    fn on_action(&mut self, kind: OperationKind, name: &str, description: &str, dry_run: bool);

    /// Called once the whole plan has been processed
    fn on_complete(&mut self, _summary: &ApplySummary) {}
}

/// Observer that only forwards actions to the `log` facade
pub struct LogObserver;

impl ApplyObserver for LogObserver {
    fn on_action(&mut self, _kind: OperationKind, _name: &str, description: &str, dry_run: bool) {
        if dry_run {
            log::info!("[dry run] {description}");
        } else {
            log::info!("{description}");
        }
    }
}

/// No-op observer
pub struct NoObserver;

impl ApplyObserver for NoObserver {
    fn on_action(&mut self, _kind: OperationKind, _name: &str, _description: &str, _dry_run: bool) {
    }
}

/// Observer that records every action, mostly useful in tests and reports
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub actions: Vec<(OperationKind, String)>,
    pub completed: Option<ApplySummary>,
}

impl ApplyObserver for RecordingObserver {
    fn on_action(&mut self, kind: OperationKind, name: &str, _description: &str, _dry_run: bool) {
        self.actions.push((kind, name.to_string()));
    }

    fn on_complete(&mut self, summary: &ApplySummary) {
        self.completed = Some(summary.clone());
    }
}

impl RecordingObserver {
    /// Number of recorded actions of one kind
    pub fn count(&self, kind: OperationKind) -> usize {
        self.actions.iter().filter(|(k, _)| *k == kind).count()
    }
}
