//! Core types for declarative reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named entry with its desired attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<A> {
    /// Identity of the entry (case-sensitive)
    pub name: String,
    /// Attributes the remote entry should carry
    pub attrs: A,
}

impl<A> Entry<A> {
    pub fn new(name: impl Into<String>, attrs: A) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }
}

/// Kind of a single mutation in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A single mutation, borrowed from a [`Plan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a, A> {
    Create { name: &'a str, attrs: &'a A },
    Update { name: &'a str, attrs: &'a A },
    Delete { name: &'a str },
}

impl<'a, A> Operation<'a, A> {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Create { name, .. } | Self::Update { name, .. } | Self::Delete { name } => name,
        }
    }
}

/// The minimal set of changes that converges actual state to desired state
///
/// Every name in `desired ∪ actual` lands in exactly one of the four buckets.
/// Buckets are ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan<A> {
    /// Desired but absent remotely
    pub to_create: Vec<Entry<A>>,
    /// Desired and present remotely; attributes come from desired
    pub to_update: Vec<Entry<A>>,
    /// Present remotely, not desired, not protected
    pub to_delete: Vec<String>,
    /// Present remotely, not desired, but protected
    pub kept: Vec<String>,
}

impl<A> Plan<A> {
    /// Total number of mutating operations in the plan
    pub fn total_operations(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    /// Check if the plan has no mutating operations
    pub fn is_empty(&self) -> bool {
        self.total_operations() == 0
    }

    /// Iterate over operations in apply order: creates, updates, deletes
    pub fn operations(&self) -> impl Iterator<Item = Operation<'_, A>> {
        let creates = self.to_create.iter().map(|e| Operation::Create {
            name: &e.name,
            attrs: &e.attrs,
        });
        let updates = self.to_update.iter().map(|e| Operation::Update {
            name: &e.name,
            attrs: &e.attrs,
        });
        let deletes = self
            .to_delete
            .iter()
            .map(|name| Operation::Delete { name });
        creates.chain(updates).chain(deletes)
    }
}

impl<A> Default for Plan<A> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
            kept: Vec::new(),
        }
    }
}

/// Summary of an apply pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub kept: usize,
    /// Actions that were logged but not invoked
    pub dry_run: bool,
}

impl ApplySummary {
    /// Total number of actions processed (invoked or, in dry run, logged)
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Record one processed operation
    pub fn add(&mut self, kind: OperationKind) {
        match kind {
            OperationKind::Create => self.created += 1,
            OperationKind::Update => self.updated += 1,
            OperationKind::Delete => self.deleted += 1,
        }
    }
}
