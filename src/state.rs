//! Observed-remove merge state.
//!
//! Every add occupies its own slot, keyed by tag. A remove tombstones the
//! slots it names and nothing else, so an add the remover never observed
//! survives it (add-wins). Among live slots the greatest tag holds the
//! visible value.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::trace;
use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::mutation::{Mutation, Op};
use crate::tag::{Clock, Tag};
use crate::value::Value;

/// The state of one tag's slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDetail {
    /// value written by the add
    pub value: Value,
    /// true once a remove observing this tag has been applied
    pub tombstone: bool,
}

/// Every tag ever associated with one key, live or tombstoned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    slots: BTreeMap<Tag, ValueDetail>,
    // Removes that named a tag before its add was applied. Only possible
    // when a log is replayed while partial.
    deferred: BTreeSet<Tag>,
}

impl KeyValue {
    fn add(&mut self, tag: Tag, value: Value) {
        let tombstone = self.deferred.remove(&tag);
        self.slots.insert(tag, ValueDetail { value, tombstone });
    }

    fn rm(&mut self, tags: &BTreeSet<Tag>) {
        for tag in tags {
            match self.slots.get_mut(tag) {
                Some(detail) => detail.tombstone = true,
                None => {
                    self.deferred.insert(tag.clone());
                }
            }
        }
    }

    /// The visible value: the live slot with the greatest tag.
    pub fn resolve(&self) -> Option<&Value> {
        self.slots
            .iter()
            .rev()
            .find(|(_, detail)| !detail.tombstone)
            .map(|(_, detail)| &detail.value)
    }

    /// True if at least one slot is live.
    pub fn is_present(&self) -> bool {
        self.slots.values().any(|detail| !detail.tombstone)
    }

    /// Tags of the live slots, in tag order.
    pub fn live_tags(&self) -> impl Iterator<Item = &Tag> {
        self.slots
            .iter()
            .filter(|(_, detail)| !detail.tombstone)
            .map(|(tag, _)| tag)
    }

    /// Look up the slot of a single tag.
    pub fn slot(&self, tag: &Tag) -> Option<&ValueDetail> {
        self.slots.get(tag)
    }

    /// Number of slots, live or tombstoned.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no add has been applied to this key.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The materialized view: a fold of applied mutations.
#[derive(Debug, Clone, Default)]
pub struct State {
    applied: HashSet<ContentHash>,
    entries: BTreeMap<String, KeyValue>,
    max_clock: Clock,
}

impl State {
    /// An empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `mutation`, identified by `hash`, into the view.
    ///
    /// Returns false without touching the view if `hash` was already
    /// applied.
    pub fn apply(&mut self, hash: ContentHash, mutation: &Mutation) -> bool {
        if !self.applied.insert(hash) {
            return false;
        }
        trace!("applying mutation {} ({} ops)", hash, mutation.ops.len());
        for op in &mutation.ops {
            self.apply_op(op);
        }
        true
    }

    fn apply_op(&mut self, op: &Op) {
        match op {
            Op::Add { key, value, tag, .. } => {
                self.max_clock = self.max_clock.max(tag.clock);
                self.entries
                    .entry(key.clone())
                    .or_default()
                    .add(tag.clone(), value.clone());
            }
            Op::Rm { key, tags, .. } => {
                if tags.is_empty() {
                    return;
                }
                self.entries.entry(key.clone()).or_default().rm(tags);
            }
        }
    }

    /// True if the mutation with this hash has been applied.
    pub fn is_applied(&self, hash: &ContentHash) -> bool {
        self.applied.contains(hash)
    }

    /// Number of applied mutations.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }

    /// The greatest tag clock seen in any applied add.
    pub fn max_clock(&self) -> Clock {
        self.max_clock
    }

    /// The visible value of `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(KeyValue::resolve)
    }

    /// True if `key` has at least one live slot.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.get(key).map(KeyValue::is_present).unwrap_or(false)
    }

    /// The full slot record of `key`.
    pub fn entry(&self, key: &str) -> Option<&KeyValue> {
        self.entries.get(key)
    }

    /// Live tags of `key`; what a local remove would invalidate.
    pub fn live_tags(&self, key: &str) -> BTreeSet<Tag> {
        self.entries
            .get(key)
            .map(|kv| kv.live_tags().cloned().collect())
            .unwrap_or_default()
    }

    /// Every present key with its visible value.
    pub fn list(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .filter_map(|(key, kv)| kv.resolve().map(|v| (key.clone(), v.clone())))
            .collect()
    }
}
