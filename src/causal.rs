//! Content-addressed causal log.
//!
//! Vertices are mutations keyed by their content hash. Every parent hash a
//! mutation lists is an edge `child -> parent`. Parents may be dangling
//! (referenced but not yet received); such a log is partial but still
//! usable.

use std::collections::{btree_map, BTreeMap, BTreeSet, HashSet};

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::hash::{hash_mutation, ContentHash, MutationHasher};
use crate::mutation::Mutation;

/// Whether every causal ancestor referenced by the log is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// Every referenced parent is a vertex of the log.
    Complete,
    /// At least one referenced parent has not been received.
    Partial,
}

/// Outcome of a successful [`CausalLog::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    /// The mutation was not known and has been inserted.
    New(ContentHash),
    /// The mutation was already in the log; nothing changed.
    Duplicate(ContentHash),
}

impl Appended {
    /// Hash of the appended mutation.
    pub fn hash(&self) -> ContentHash {
        match *self {
            Appended::New(hash) | Appended::Duplicate(hash) => hash,
        }
    }

    /// True if the append inserted a new vertex.
    pub fn is_new(&self) -> bool {
        matches!(self, Appended::New(_))
    }
}

/// A DAG of immutable mutations.
#[derive(Debug, Clone)]
pub struct CausalLog {
    hasher: MutationHasher,
    vertices: BTreeMap<ContentHash, Mutation>,
}

impl Default for CausalLog {
    fn default() -> Self {
        CausalLog::new()
    }
}

impl CausalLog {
    /// An empty log using the default content hasher.
    pub fn new() -> Self {
        Self::with_hasher(hash_mutation)
    }

    /// An empty log identifying mutations with `hasher`.
    pub fn with_hasher(hasher: MutationHasher) -> Self {
        CausalLog {
            hasher,
            vertices: BTreeMap::new(),
        }
    }

    /// The content hash of `mutation` as this log computes it.
    pub fn hash_of(&self, mutation: &Mutation) -> Result<ContentHash> {
        (self.hasher)(mutation)
    }

    /// Insert a mutation and its parent edges.
    ///
    /// Appending a known mutation is a no-op. If one of the new edges would
    /// close a cycle the mutation is rejected with
    /// [`Error::CycleDetected`] and the log is left untouched.
    pub fn append(&mut self, mutation: Mutation) -> Result<Appended> {
        let hash = self.hash_of(&mutation)?;
        if self.vertices.contains_key(&hash) {
            return Ok(Appended::Duplicate(hash));
        }

        if mutation.parents.iter().any(|parent| self.reaches(parent, &hash)) {
            warn!("rejecting mutation {}: parent edges would form a cycle", hash);
            return Err(Error::CycleDetected { hash });
        }

        debug!(
            "appending mutation {} from {} ({} ops, {} parents)",
            hash,
            mutation.origin,
            mutation.ops.len(),
            mutation.parents.len()
        );
        self.vertices.insert(hash, mutation);
        Ok(Appended::New(hash))
    }

    /// True if `target` is reachable from `from` by following parent edges.
    fn reaches(&self, from: &ContentHash, target: &ContentHash) -> bool {
        let mut stack = vec![*from];
        let mut seen = HashSet::new();
        while let Some(cur) = stack.pop() {
            if &cur == target {
                return true;
            }
            if !seen.insert(cur) {
                continue;
            }
            if let Some(mutation) = self.vertices.get(&cur) {
                stack.extend(mutation.parents.iter().copied());
            }
        }
        false
    }

    /// The causal frontier: vertices no other vertex lists as a parent.
    ///
    /// New local mutations declare these as their parents.
    pub fn heads(&self) -> BTreeSet<ContentHash> {
        let referenced: HashSet<&ContentHash> = self
            .vertices
            .values()
            .flat_map(|mutation| mutation.parents.iter())
            .collect();
        self.vertices
            .keys()
            .filter(|hash| !referenced.contains(hash))
            .copied()
            .collect()
    }

    /// Parent hashes referenced by some vertex but absent from the log.
    pub fn missing(&self) -> BTreeSet<ContentHash> {
        self.vertices
            .values()
            .flat_map(|mutation| mutation.parents.iter())
            .filter(|parent| !self.vertices.contains_key(*parent))
            .copied()
            .collect()
    }

    /// True iff every referenced parent is present as a vertex.
    pub fn is_complete(&self) -> bool {
        self.vertices
            .values()
            .flat_map(|mutation| mutation.parents.iter())
            .all(|parent| self.vertices.contains_key(parent))
    }

    /// [`CausalLog::is_complete`] as a [`Completeness`].
    pub fn completeness(&self) -> Completeness {
        if self.is_complete() {
            Completeness::Complete
        } else {
            Completeness::Partial
        }
    }

    /// Look up a mutation by hash.
    pub fn get(&self, hash: &ContentHash) -> Option<&Mutation> {
        self.vertices.get(hash)
    }

    /// True if a mutation with this hash is in the log.
    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.vertices.contains_key(hash)
    }

    /// Number of mutations in the log.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if the log holds no mutations.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate over `(hash, mutation)` in hash order.
    pub fn iter(&self) -> btree_map::Iter<ContentHash, Mutation> {
        self.vertices.iter()
    }
}
