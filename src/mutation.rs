use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::{hash_mutation, ContentHash};
use crate::tag::{ReplicaId, Tag};
use crate::value::Value;

/// A single change to one key.
///
/// `wall_time` is informational: it is part of the mutation's identity
/// but never consulted when resolving a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Associate `value` with `key` under a freshly minted tag.
    Add {
        /// the key being written
        key: String,
        /// the value being written
        value: Value,
        /// the new tag identifying this add
        tag: Tag,
        /// local time at which the add was made
        wall_time: DateTime<Utc>,
    },
    /// Invalidate the adds of `key` the remover had observed.
    Rm {
        /// the key being removed
        key: String,
        /// tags observed live at the time of removal
        tags: BTreeSet<Tag>,
        /// local time at which the remove was made
        wall_time: DateTime<Utc>,
    },
}

impl Op {
    /// Build an add stamped with the current time.
    pub fn add(key: impl Into<String>, value: impl Into<Value>, tag: Tag) -> Self {
        Op::Add {
            key: key.into(),
            value: value.into(),
            tag,
            wall_time: Utc::now(),
        }
    }

    /// Build a remove stamped with the current time.
    pub fn rm(key: impl Into<String>, tags: BTreeSet<Tag>) -> Self {
        Op::Rm {
            key: key.into(),
            tags,
            wall_time: Utc::now(),
        }
    }

    /// The key this operation touches.
    pub fn key(&self) -> &str {
        match self {
            Op::Add { key, .. } | Op::Rm { key, .. } => key,
        }
    }

    /// When the operation was made, according to its author.
    pub fn wall_time(&self) -> DateTime<Utc> {
        match self {
            Op::Add { wall_time, .. } | Op::Rm { wall_time, .. } => *wall_time,
        }
    }
}

/// An immutable, content-addressed batch of operations.
///
/// `parents` is the causal frontier of the authoring replica when the
/// mutation was made; the mutation happens-after every one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    /// Operations, applied in order
    pub ops: Vec<Op>,
    /// Hashes of the mutations this one causally follows
    pub parents: BTreeSet<ContentHash>,
    /// The replica that authored this mutation
    pub origin: ReplicaId,
}

impl Mutation {
    /// Build a mutation.
    pub fn new(origin: impl Into<ReplicaId>, parents: BTreeSet<ContentHash>, ops: Vec<Op>) -> Self {
        Mutation {
            ops,
            parents,
            origin: origin.into(),
        }
    }

    /// The content hash of this mutation under the default hasher.
    pub fn hash(&self) -> Result<ContentHash> {
        hash_mutation(self)
    }
}
