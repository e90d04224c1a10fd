//! Deterministic replay order of a causal log.
//!
//! Parents come before children; mutations with no causal relation to one
//! another are ordered by content hash, so every replica holding the same
//! log replays it in the same order. Parents absent from the log are
//! ignored.
//!
//! The order is recomputed over the whole log on every call, at
//! O((V + E) log V). Maintaining it incrementally is the obvious next step
//! if this shows up in profiles.

use std::collections::{BTreeSet, HashMap};

use crate::causal::CausalLog;
use crate::hash::ContentHash;

/// Parents-first topological order of every mutation in `log`.
pub fn causal_order(log: &CausalLog) -> Vec<ContentHash> {
    let mut indegree: HashMap<ContentHash, usize> = HashMap::with_capacity(log.len());
    let mut children: HashMap<ContentHash, Vec<ContentHash>> = HashMap::new();
    for (hash, mutation) in log.iter() {
        let mut deg = 0;
        for parent in mutation.parents.iter().filter(|p| log.contains(p)) {
            children.entry(*parent).or_default().push(*hash);
            deg += 1;
        }
        indegree.insert(*hash, deg);
    }

    let mut ready: BTreeSet<ContentHash> = indegree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(hash, _)| *hash)
        .collect();

    let mut out = Vec::with_capacity(log.len());
    while let Some(hash) = ready.iter().next().copied() {
        ready.remove(&hash);
        out.push(hash);

        for child in children.get(&hash).into_iter().flatten() {
            if let Some(deg) = indegree.get_mut(child) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(*child);
                }
            }
        }
    }
    out
}
