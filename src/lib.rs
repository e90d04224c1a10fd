//! A replicated key-value map that converges without coordination.
//!
//! `OrSetMap` is an Observed-Remove Set Map: every local `add` or `remove`
//! is recorded as an immutable [`Mutation`] in a content-addressed causal
//! log (a DAG whose edges point from a mutation to the mutations it
//! causally follows). The log is linearized into a deterministic replay
//! order and folded into a materialized view with add-wins set semantics
//! and last-write-wins value selection among surviving writes.
//!
//! Replicas exchange their logs with [`OrSetMap::export_log`] and
//! [`OrSetMap::import_log`]. Two replicas that have seen the same set of
//! mutations compute the same view, regardless of delivery order.
//!
//! ```
//! use orsetmap::OrSetMap;
//!
//! let a = OrSetMap::new("A");
//! let b = OrSetMap::new("B");
//!
//! a.add("fruit", "apple").unwrap();
//! b.import_log(a.export_log()).unwrap();
//! assert_eq!(b.get("fruit"), Some("apple".into()));
//!
//! // concurrent edits: b removes what it observed, a re-adds
//! b.remove("fruit").unwrap();
//! a.add("fruit", "cherry").unwrap();
//!
//! a.merge(&b).unwrap();
//! b.merge(&a).unwrap();
//! assert_eq!(a.list(), b.list());
//! assert_eq!(a.get("fruit"), Some("cherry".into()));
//! ```
#![crate_type = "lib"]
#![deny(missing_docs)]

mod error;
pub use crate::error::Error;

/// This module contains the scalar values stored in the map.
pub mod value;

/// This module contains the causal identity of a single add.
pub mod tag;

/// This module contains content hashing of mutations.
pub mod hash;

/// This module contains the operations and mutations recorded in the log.
pub mod mutation;

/// This module contains the content-addressed causal log.
pub mod causal;

/// This module contains the deterministic replay order of a causal log.
pub mod order;

/// This module contains the per-key observed-remove merge state.
pub mod state;

/// This module contains the replicated map itself.
pub mod map;

// Top-level re-exports.
pub use crate::{
    causal::{Appended, CausalLog, Completeness},
    hash::{ContentHash, MutationHasher},
    map::OrSetMap,
    mutation::{Mutation, Op},
    order::causal_order,
    state::{KeyValue, State, ValueDetail},
    tag::{Clock, ReplicaId, Tag},
    value::{Value, ValueType},
};
