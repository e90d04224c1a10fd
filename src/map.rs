use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};
use uuid::Uuid;

use crate::causal::{Appended, CausalLog, Completeness};
use crate::error::{Error, Result};
use crate::hash::{hash_mutation, ContentHash, MutationHasher};
use crate::mutation::{Mutation, Op};
use crate::order::causal_order;
use crate::state::State;
use crate::tag::{Clock, ReplicaId, Tag};
use crate::value::Value;

/// A replicated key-value map with observed-remove semantics.
///
/// All operations take `&self` and are serialized by an internal lock;
/// the map can be shared between threads behind an `Arc`. Separate
/// replicas need no coordination: they exchange logs with
/// [`OrSetMap::export_log`] / [`OrSetMap::import_log`] in any order, as
/// often as they like.
///
/// ```
/// use orsetmap::OrSetMap;
///
/// let map = OrSetMap::new("A");
/// map.add("fruit", "apple").unwrap();
/// map.add("fruit", "banana").unwrap();
/// assert_eq!(map.get("fruit"), Some("banana".into()));
///
/// map.remove("fruit").unwrap();
/// assert!(!map.contains("fruit"));
/// assert!(map.list().is_empty());
/// ```
#[derive(Debug)]
pub struct OrSetMap {
    replica: ReplicaId,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    // Lamport clock for minting tags; never behind `state.max_clock()`.
    clock: Clock,
    log: CausalLog,
    state: State,
}

impl Default for OrSetMap {
    /// A map owned by a randomly identified replica.
    fn default() -> Self {
        OrSetMap::new(Uuid::new_v4().to_string())
    }
}

impl OrSetMap {
    /// An empty map owned by `replica`.
    ///
    /// Replica identifiers must be unique among the replicas that will
    /// ever exchange logs.
    pub fn new(replica: impl Into<ReplicaId>) -> Self {
        Self::with_hasher(replica, hash_mutation)
    }

    /// An empty map whose log identifies mutations with `hasher`.
    ///
    /// Every replica exchanging logs must use the same hasher.
    pub fn with_hasher(replica: impl Into<ReplicaId>, hasher: MutationHasher) -> Self {
        OrSetMap {
            replica: replica.into(),
            inner: Mutex::new(Inner {
                clock: 0,
                log: CausalLog::with_hasher(hasher),
                state: State::new(),
            }),
        }
    }

    // The guarded state only changes through whole append-and-replay
    // steps, so it stays consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The identifier of the replica owning this map.
    pub fn replica(&self) -> &str {
        &self.replica
    }

    /// Write `value` under `key`.
    ///
    /// The write gets a new tag that is greater than every tag this replica
    /// has seen, so it supersedes all values currently visible here. Fails
    /// with [`Error::ClockExhausted`] if a tag at `u64::MAX` has been seen.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<ContentHash> {
        let mut inner = self.lock();
        let tag = inner.next_tag(&self.replica)?;
        let op = Op::add(key, value, tag);
        inner.commit(&self.replica, op)
    }

    /// Remove `key`, invalidating every value of it observed so far.
    ///
    /// Concurrent adds on other replicas that this replica has not seen
    /// survive the removal. Removing an absent key still records a
    /// mutation that invalidates nothing.
    pub fn remove(&self, key: impl Into<String>) -> Result<ContentHash> {
        let key = key.into();
        let mut inner = self.lock();
        let tags = inner.state.live_tags(&key);
        let op = Op::rm(key, tags);
        inner.commit(&self.replica, op)
    }

    /// The visible value of `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().state.get(key).cloned()
    }

    /// True if `key` has a visible value.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().state.contains(key)
    }

    /// Every present key with its visible value.
    pub fn list(&self) -> BTreeMap<String, Value> {
        self.lock().state.list()
    }

    /// The whole log in causal replay order, ready to ship to another
    /// replica.
    pub fn export_log(&self) -> Vec<Mutation> {
        let inner = self.lock();
        causal_order(&inner.log)
            .iter()
            .filter_map(|hash| inner.log.get(hash).cloned())
            .collect()
    }

    /// Append `mutations` to the log and replay.
    ///
    /// Mutations may arrive in any order, more than once, and with parents
    /// that have not been received yet; the view reflects whatever is
    /// derivable and [`OrSetMap::is_complete`] reports any gap.
    ///
    /// Returns the number of mutations that were new to this replica. Each
    /// mutation is appended independently: a rejected one leaves the log
    /// untouched, the rest of the batch is still appended and applied, and
    /// the first rejection is returned as the error.
    pub fn import_log<I>(&self, mutations: I) -> Result<usize>
    where
        I: IntoIterator<Item = Mutation>,
    {
        let mut inner = self.lock();
        let mut appended = 0;
        let mut rejected = Vec::new();
        for mutation in mutations {
            match inner.log.append(mutation) {
                Ok(Appended::New(_)) => appended += 1,
                Ok(Appended::Duplicate(_)) => {}
                Err(err) => {
                    warn!("{}: rejected imported mutation: {}", self.replica, err);
                    rejected.push(err);
                }
            }
        }
        inner.replay();

        let missing = inner.log.missing();
        if !missing.is_empty() {
            debug!("{}: log is partial, {} ancestors missing", self.replica, missing.len());
        }

        match rejected.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(appended),
        }
    }

    /// Import everything `other` knows.
    pub fn merge(&self, other: &OrSetMap) -> Result<usize> {
        let log = other.export_log();
        self.import_log(log)
    }

    /// The causal frontier new local mutations will descend from.
    pub fn heads(&self) -> BTreeSet<ContentHash> {
        self.lock().log.heads()
    }

    /// True if every causal ancestor referenced by the log has been
    /// received.
    pub fn is_complete(&self) -> bool {
        self.lock().log.is_complete()
    }

    /// [`OrSetMap::is_complete`] as a [`Completeness`].
    pub fn completeness(&self) -> Completeness {
        self.lock().log.completeness()
    }

    /// Parent hashes referenced by the log that have not been received.
    pub fn missing_ancestors(&self) -> BTreeSet<ContentHash> {
        self.lock().log.missing()
    }

    /// Number of mutations in the log.
    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    /// True if the log holds no mutations.
    pub fn is_empty(&self) -> bool {
        self.lock().log.is_empty()
    }
}

impl Inner {
    fn next_tag(&mut self, replica: &str) -> Result<Tag> {
        let seen = self.clock.max(self.state.max_clock());
        let clock = seen.checked_add(1).ok_or_else(|| {
            warn!("{}: cannot mint a tag past clock {}", replica, seen);
            Error::ClockExhausted { clock: seen }
        })?;
        self.clock = clock;
        Ok(Tag::new(clock, replica))
    }

    fn commit(&mut self, replica: &str, op: Op) -> Result<ContentHash> {
        let mutation = Mutation::new(replica, self.log.heads(), vec![op]);
        let hash = match self.log.append(mutation) {
            Ok(appended) => appended.hash(),
            Err(err) => {
                warn!("{}: local mutation rejected: {}", replica, err);
                return Err(err);
            }
        };
        self.replay();
        Ok(hash)
    }

    /// Feed every not-yet-applied mutation to the state, in causal order.
    fn replay(&mut self) -> usize {
        let mut applied = 0;
        for hash in causal_order(&self.log) {
            if let Some(mutation) = self.log.get(&hash) {
                if self.state.apply(hash, mutation) {
                    applied += 1;
                }
            }
        }
        self.clock = self.clock.max(self.state.max_clock());
        debug!("replayed {} new mutations ({} in log)", applied, self.log.len());
        applied
    }
}
