use thiserror::Error;

use crate::hash::ContentHash;
use crate::tag::Clock;

/// Result alias to reduce redundancy in function return types
pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Possible errors when recording mutations.
///
/// A missing causal ancestor is not an error: logs with dangling parents
/// are accepted and reported through [`crate::CausalLog::missing`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Recording the mutation would close a cycle in the causal log.
    ///
    /// The mutation is rejected and the log is left unchanged. Retrying
    /// the same mutation will fail the same way.
    #[error("mutation {hash} would introduce a cycle in the causal log")]
    CycleDetected {
        /// Content hash of the rejected mutation
        hash: ContentHash,
    },

    /// The replica has observed a tag at the greatest representable clock,
    /// so no later tag can be minted for a local add.
    #[error("tag clock exhausted at {clock}")]
    ClockExhausted {
        /// The clock value that cannot be advanced
        clock: Clock,
    },

    /// The mutation could not be canonically encoded for hashing.
    #[error("failed to encode mutation: {0}")]
    Encoding(String),
}

impl From<serde_cbor::Error> for Error {
    fn from(err: serde_cbor::Error) -> Self {
        Error::Encoding(err.to_string())
    }
}
