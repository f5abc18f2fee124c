//! # Declarative
//!
//! Reconciliation of remote collections against a desired-state declaration.
//!
//! A pass has three steps: fold the remote listing into an `actual` mapping,
//! [`diff`] it against the `desired` mapping, then [`apply`] the resulting
//! [`Plan`] through a [`Mutator`]. A persisted version marker lets callers
//! skip the whole pass when nothing changed ([`should_skip`]).
//!
//! ## Core Concepts
//!
//! - **Desired state**: names mapped to the attributes they should carry,
//!   usually a local override map merged under a mandatory baseline
//!   ([`merge_baseline`])
//! - **Actual state**: the same names as observed remotely ([`fold_pages`])
//! - **Plan**: create / update / delete / kept buckets
//! - **Mutator**: the three remote verbs for one resource type
//!
//! ## Example
//!
//! ```
//! use declarative::{apply, diff, LogObserver, Mutator};
//! use std::collections::BTreeMap;
//!
//! struct Labels(BTreeMap<String, String>);
//!
//! impl Mutator<String> for Labels {
//!     fn resource_type(&self) -> &'static str { "label" }
//!     fn create(&mut self, name: &str, color: &String) -> anyhow::Result<()> {
//!         self.0.insert(name.to_string(), color.clone());
//!         Ok(())
//!     }
//!     fn update(&mut self, name: &str, color: &String) -> anyhow::Result<()> {
//!         self.create(name, color)
//!     }
//!     fn delete(&mut self, name: &str) -> anyhow::Result<()> {
//!         self.0.remove(name);
//!         Ok(())
//!     }
//! }
//!
//! let desired = BTreeMap::from([("bug".to_string(), "b60205".to_string())]);
//! let mut remote = Labels(BTreeMap::from([("wontfix".to_string(), "ffffff".to_string())]));
//!
//! let plan = diff(&desired, &remote.0, &[]);
//! apply(&plan, &mut remote, &mut LogObserver, false)?;
//! assert_eq!(remote.0, desired);
//! # Ok::<(), declarative::ApplyError>(())
//! ```

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod marker;
pub mod pages;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyObserver, LogObserver, Mutator, NoObserver, RecordingObserver};
pub use diff::{diff, merge_baseline};
pub use error::ApplyError;
pub use executor::{apply, reconcile};
pub use marker::{composite, should_skip};
pub use pages::fold_pages;
pub use types::{ApplySummary, Entry, Operation, OperationKind, Plan};
