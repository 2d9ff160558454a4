//! Error types for clearance operations.
//!
//! Nothing in this crate is fatal. Every failure is reported at the
//! boundary where it happens, and leaves state untouched: a rejected
//! mutation changes nothing, an undecodable delta leaves the mirror as it
//! was. The worst case is a stale or empty clearance view, which denies
//! access rather than granting it.

use thiserror::Error;

use crate::core::{ClearanceToken, EntityId};

/// Result type for clearance operations.
pub type ClearanceResult<T> = Result<T, ClearanceError>;

/// Errors returned by clearance holders, consumers and replication.
#[derive(Debug, Error)]
pub enum ClearanceError {
    /// A consumer expected a clearance holder on a target and found none.
    #[error("{entity} has no clearance holder")]
    MissingCapabilityHolder { entity: EntityId },

    /// A mutation was attempted on a non-authority (or shut down) holder.
    #[error("{entity} is not the clearance authority")]
    NotAuthorized { entity: EntityId },

    /// Positional operation outside the set.
    #[error("index {index} out of range for clearance set of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Replication carried an operation code this build doesn't know.
    #[error("unknown replication operation code {code}")]
    UnknownReplicationOperation { code: u8 },

    /// Replication carried a set id this build doesn't know.
    #[error("unknown clearance profile code {code}")]
    UnknownProfile { code: u8 },

    /// A delta is missing the token its operation needs.
    #[error("replication delta {sequence} for {entity} is malformed")]
    MalformedDelta { entity: EntityId, sequence: u64 },

    /// A set index too large for the wire's 32-bit index field.
    #[error("replication delta {sequence} for {entity} has index {index} beyond the wire range")]
    WireIndexOverflow {
        entity: EntityId,
        sequence: u64,
        index: usize,
    },

    /// A delta arrived out of sequence; the mirror needs a fresh snapshot.
    #[error("replication gap for {entity}: expected sequence {expected}, received {received}")]
    ReplicationGap {
        entity: EntityId,
        expected: u64,
        received: u64,
    },

    /// A message addressed to one entity was applied to another.
    #[error("replication message for {received} applied to {entity}")]
    EntityMismatch { entity: EntityId, received: EntityId },

    /// The authority was handed replicated state.
    #[error("{entity} is the clearance authority and does not accept replicated state")]
    AuthorityReplay { entity: EntityId },

    /// A token outside the game's vocabulary.
    #[error("{token} is not part of the clearance vocabulary")]
    UnknownToken { token: ClearanceToken },

    /// A token name outside the game's vocabulary.
    #[error("'{name}' is not a known clearance name")]
    UnknownTokenName { name: String },

    /// Wire encoding or decoding failed.
    #[error("replication codec error: {0}")]
    Codec(#[from] bincode::Error),
}
