//! Plan computation from desired and actual state

use crate::types::{Entry, Plan};
use std::collections::{BTreeMap, BTreeSet};

/// Compute the plan that converges `actual` to `desired`
///
/// Names are compared exactly (case-sensitive). Names in `protect` are never
/// scheduled for deletion, even when they are absent from `desired`; such
/// names are reported in [`Plan::kept`] instead.
pub fn diff<A, B>(
    desired: &BTreeMap<String, A>,
    actual: &BTreeMap<String, B>,
    protect: &[&str],
) -> Plan<A>
where
    A: Clone,
{
    let protect: BTreeSet<&str> = protect.iter().copied().collect();
    let mut plan = Plan::default();

    for (name, attrs) in desired {
        let entry = Entry::new(name.clone(), attrs.clone());
        if actual.contains_key(name) {
            plan.to_update.push(entry);
        } else {
            plan.to_create.push(entry);
        }
    }

    for name in actual.keys().filter(|n| !desired.contains_key(*n)) {
        if protect.contains(name.as_str()) {
            plan.kept.push(name.clone());
        } else {
            plan.to_delete.push(name.clone());
        }
    }

    plan
}

/// Merge baseline entries over local overrides
///
/// Baseline entries are mandatory policy: on a name conflict the baseline
/// value wins.
pub fn merge_baseline<A: Clone>(
    baseline: &BTreeMap<String, A>,
    overrides: &BTreeMap<String, A>,
) -> BTreeMap<String, A> {
    let mut merged = overrides.clone();
    for (name, attrs) in baseline {
        merged.insert(name.clone(), attrs.clone());
    }
    merged
}
