//! Execution engine - applies a plan sequentially, fail-fast

use crate::context::{ApplyObserver, Mutator};
use crate::diff::diff;
use crate::error::ApplyError;
use crate::types::{ApplySummary, Operation, Plan};
use std::collections::BTreeMap;

/// Apply a plan through a mutator
///
/// Operations run in order: creates, updates, deletes. Each one is reported
/// to the observer before it is invoked. Updates are unconditional.
///
/// When `dry_run` is set every operation is still reported but none is
/// invoked. The first failing call aborts the rest of the plan; nothing that
/// already ran is rolled back.
pub fn apply<A, M, O>(
    plan: &Plan<A>,
    mutator: &mut M,
    observer: &mut O,
    dry_run: bool,
) -> Result<ApplySummary, ApplyError>
where
    M: Mutator<A> + ?Sized,
    O: ApplyObserver + ?Sized,
{
    if plan.is_empty() {
        log::debug!("{}: nothing to apply", mutator.resource_type());
    }

    let mut summary = ApplySummary {
        kept: plan.kept.len(),
        dry_run,
        ..Default::default()
    };

    for op in plan.operations() {
        let description = mutator.describe(&op);
        observer.on_action(op.kind(), op.name(), &description, dry_run);

        if !dry_run {
            invoke(mutator, &op).map_err(|source| ApplyError {
                kind: op.kind(),
                resource_type: mutator.resource_type().to_string(),
                name: op.name().to_string(),
                completed: summary.total_changes(),
                source,
            })?;
        }

        summary.add(op.kind());
    }

    log::debug!(
        "{}: {} created, {} updated, {} deleted, {} kept{}",
        mutator.resource_type(),
        summary.created,
        summary.updated,
        summary.deleted,
        summary.kept,
        if dry_run { " (dry run)" } else { "" }
    );
    observer.on_complete(&summary);

    Ok(summary)
}

fn invoke<A, M>(mutator: &mut M, op: &Operation<'_, A>) -> anyhow::Result<()>
where
    M: Mutator<A> + ?Sized,
{
    match *op {
        Operation::Create { name, attrs } => mutator.create(name, attrs),
        Operation::Update { name, attrs } => mutator.update(name, attrs),
        Operation::Delete { name } => mutator.delete(name),
    }
}

/// Diff then apply in one step
pub fn reconcile<A, B, M, O>(
    desired: &BTreeMap<String, A>,
    actual: &BTreeMap<String, B>,
    protect: &[&str],
    mutator: &mut M,
    observer: &mut O,
    dry_run: bool,
) -> Result<ApplySummary, ApplyError>
where
    A: Clone,
    M: Mutator<A> + ?Sized,
    O: ApplyObserver + ?Sized,
{
    let plan = diff(desired, actual, protect);
    apply(&plan, mutator, observer, dry_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{NoObserver, RecordingObserver};
    use crate::types::OperationKind;
    use anyhow::{Result, bail};

    /// In-memory remote collection
    #[derive(Default)]
    struct MemoryRemote {
        items: BTreeMap<String, String>,
        calls: Vec<String>,
        fail_on: Option<String>,
    }

    impl Mutator<String> for MemoryRemote {
        fn resource_type(&self) -> &'static str {
            "label"
        }

        fn create(&mut self, name: &str, attrs: &String) -> Result<()> {
            self.calls.push(format!("create {name}"));
            if self.fail_on.as_deref() == Some(name) {
                bail!("HTTP 422");
            }
            self.items.insert(name.to_string(), attrs.clone());
            Ok(())
        }

        fn update(&mut self, name: &str, attrs: &String) -> Result<()> {
            self.calls.push(format!("update {name}"));
            if self.fail_on.as_deref() == Some(name) {
                bail!("HTTP 500");
            }
            self.items.insert(name.to_string(), attrs.clone());
            Ok(())
        }

        fn delete(&mut self, name: &str) -> Result<()> {
            self.calls.push(format!("delete {name}"));
            self.items.remove(name);
            Ok(())
        }
    }

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn scenario() -> (BTreeMap<String, String>, MemoryRemote) {
        let desired = map(&[("A", "red"), ("B", "blue")]);
        let remote = MemoryRemote {
            items: map(&[("B", "green"), ("C", "black")]),
            ..Default::default()
        };
        (desired, remote)
    }

    #[test]
    fn test_apply_converges() {
        let (desired, mut remote) = scenario();
        let plan = diff(&desired, &remote.items, &[]);

        let summary = apply(&plan, &mut remote, &mut NoObserver, false).unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(remote.items, desired);
        assert_eq!(remote.calls, vec!["create A", "update B", "delete C"]);
    }

    #[test]
    fn test_rediff_after_apply_is_idempotent() {
        let (desired, mut remote) = scenario();
        reconcile(&desired, &remote.items.clone(), &[], &mut remote, &mut NoObserver, false)
            .unwrap();

        let plan = diff(&desired, &remote.items, &[]);

        assert!(plan.to_create.is_empty());
        assert!(plan.to_delete.is_empty());
        let updates: Vec<_> = plan.to_update.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(updates, vec!["A", "B"]);
    }

    #[test]
    fn test_dry_run_logs_without_mutating() {
        let (desired, mut remote) = scenario();
        let before = remote.items.clone();
        let plan = diff(&desired, &remote.items, &[]);
        let mut observer = RecordingObserver::default();

        let summary = apply(&plan, &mut remote, &mut observer, true).unwrap();

        assert!(remote.calls.is_empty());
        assert_eq!(remote.items, before);
        assert_eq!(observer.actions.len(), 3);
        assert_eq!(observer.count(OperationKind::Create), 1);
        assert_eq!(observer.count(OperationKind::Update), 1);
        assert_eq!(observer.count(OperationKind::Delete), 1);
        assert!(summary.dry_run);
        assert_eq!(observer.completed, Some(summary));
    }

    #[test]
    fn test_failure_aborts_remaining_plan() {
        let (desired, mut remote) = scenario();
        remote.fail_on = Some("B".to_string());
        let plan = diff(&desired, &remote.items, &[]);

        let err = apply(&plan, &mut remote, &mut NoObserver, false).unwrap_err();

        assert_eq!(err.kind, OperationKind::Update);
        assert_eq!(err.name, "B");
        assert_eq!(err.completed, 1);
        assert_eq!(remote.calls, vec!["create A", "update B"]);
        assert!(remote.items.contains_key("C"));
    }

    #[test]
    fn test_rerun_after_partial_failure_finishes() {
        let (desired, mut remote) = scenario();
        remote.fail_on = Some("B".to_string());
        let _ = reconcile(&desired, &remote.items.clone(), &[], &mut remote, &mut NoObserver, false);
        remote.fail_on = None;

        let plan = diff(&desired, &remote.items, &[]);
        assert!(plan.to_create.is_empty());
        assert_eq!(plan.to_delete, vec!["C".to_string()]);

        apply(&plan, &mut remote, &mut NoObserver, false).unwrap();
        assert_eq!(remote.items, desired);
    }

    #[test]
    fn test_protected_entries_survive() {
        let desired = map(&[("A", "red")]);
        let mut remote = MemoryRemote {
            items: map(&[("main", "rules")]),
            ..Default::default()
        };

        let summary = reconcile(
            &desired,
            &remote.items.clone(),
            &["main"],
            &mut remote,
            &mut NoObserver,
            false,
        )
        .unwrap();

        assert_eq!(summary.kept, 1);
        assert_eq!(summary.deleted, 0);
        assert!(remote.items.contains_key("main"));
    }

    #[test]
    fn test_describe_default() {
        let remote = MemoryRemote::default();
        let attrs = "red".to_string();
        let op = Operation::Create {
            name: "bug",
            attrs: &attrs,
        };
        assert_eq!(remote.describe(&op), "Creating `bug` label.");
    }
}
