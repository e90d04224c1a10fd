use std::fmt;

use quickcheck::{Arbitrary, Gen};
use serde::{Deserialize, Serialize};

/// Identifier of the replica that minted a tag or authored a mutation.
pub type ReplicaId = String;

/// Causal clock value carried by a tag.
pub type Clock = u64;

/// Tag is the causal identity of a single add.
///
/// Tags are unique across replicas because they carry the minting
/// replica's identifier next to its clock. They are totally ordered by
/// clock first and replica second, which is the order used to pick the
/// visible value of a key.
///
/// ```
/// use orsetmap::Tag;
///
/// assert!(Tag::new(2, "A") > Tag::new(1, "B"));
/// assert!(Tag::new(1, "B") > Tag::new(1, "A"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// The clock of the minting replica when the add was made
    pub clock: Clock,
    /// The minting replica
    pub replica: ReplicaId,
}

impl Tag {
    /// Build a Tag from a clock value and a replica identifier
    pub fn new(clock: Clock, replica: impl Into<ReplicaId>) -> Self {
        Self {
            clock,
            replica: replica.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.clock, self.replica)
    }
}

impl Arbitrary for Tag {
    fn arbitrary<G: Gen>(g: &mut G) -> Self {
        Tag {
            clock: u64::arbitrary(g) % 50,
            replica: format!("r{}", u8::arbitrary(g) % 5),
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let mut shrunk_tags = Vec::new();
        if self.clock > 0 {
            shrunk_tags.push(Self::new(self.clock - 1, self.replica.clone()));
        }
        Box::new(shrunk_tags.into_iter())
    }
}
