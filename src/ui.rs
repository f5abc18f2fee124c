use colored::Colorize;
use declarative::{ApplyObserver, ApplySummary, OperationKind};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

// ============================================================================
// Reconciliation progress
// ============================================================================

/// Prints each reconciliation action as a muted line.
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ApplyObserver for Reporter {
    fn on_action(&mut self, kind: OperationKind, name: &str, description: &str, dry_run: bool) {
        log::debug!("{kind} `{name}`");
        if self.quiet {
            return;
        }
        if dry_run {
            dim(&format!("{} {description}", "[dry run]".yellow()));
        } else {
            dim(description);
        }
    }

    fn on_complete(&mut self, summary: &ApplySummary) {
        if self.quiet || summary.total_changes() + summary.kept == 0 {
            return;
        }
        let verb = if summary.dry_run { "would change" } else { "changed" };
        dim(&format!(
            "{} {verb}: {} created, {} updated, {} deleted, {} kept",
            summary.total_changes(),
            summary.created,
            summary.updated,
            summary.deleted,
            summary.kept
        ));
    }
}
