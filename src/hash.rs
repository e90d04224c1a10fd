//! Content addressing of mutations.
//!
//! A mutation's identity is blake3 over a domain separator followed by its
//! CBOR encoding. Unordered parts of a mutation (parent hashes, removed
//! tags) are held in ordered sets, so logically identical mutations
//! encode, and therefore hash, identically on every replica.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mutation::Mutation;

/// Domain separator prepended to the encoding of every mutation.
pub const MUTATION_HASH_DOMAIN: &[u8] = b"ORSETMAP_MUTATION_V1";

/// Function computing the identity of a mutation.
pub type MutationHasher = fn(&Mutation) -> Result<ContentHash>;

/// A 32-byte digest identifying a mutation in the causal log.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ContentHash(bytes)
    }

    /// Digest of arbitrary bytes.
    pub fn digest(data: &[u8]) -> Self {
        ContentHash(*blake3::hash(data).as_bytes())
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..12])
    }
}

/// Deterministic CBOR bytes for hashing.
pub fn canonical_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_cbor::to_vec(value)?)
}

/// The default [`MutationHasher`]: blake3(domain || cbor(mutation)).
pub fn hash_mutation(mutation: &Mutation) -> Result<ContentHash> {
    let bytes = canonical_cbor(mutation)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(MUTATION_HASH_DOMAIN);
    hasher.update(&bytes);
    Ok(ContentHash(*hasher.finalize().as_bytes()))
}
