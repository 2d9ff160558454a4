//! # rust-clearance
//!
//! Server-authoritative access clearance for multiplayer games.
//!
//! An entity (ID card, PDA, implant) holds a list of clearance tokens. Doors,
//! consoles and other consumers ask whether the active list contains a token.
//! The server owns the lists; every client keeps a read-only mirror that is
//! kept in step by replaying the server's operations in order.
//!
//! ## Design Principles
//!
//! 1. **Single Writer**: Only the authority mutates. Observer mirrors change
//!    only by replaying replicated operations.
//!
//! 2. **Ordered Lists, Not Sets**: Tokens keep insertion order and may repeat.
//!    Access checks only test membership.
//!
//! 3. **Two Profiles**: Every holder carries a normal list and a low-population
//!    list. The active profile picks which one consumers read.
//!
//! ## Architecture
//!
//! - **Operation Log**: Each mutation is one `SetChange`, delivered to local
//!   listeners and queued as a sequenced delta for replication.
//!
//! - **Persistent Data Structures**: O(1) snapshot clones via `im-rs`, so a
//!   late joiner's snapshot never copies the lists.
//!
//! - **Gap Detection**: Deltas are numbered per entity. A mirror that sees a
//!   gap stops applying and asks for a resync snapshot.
//!
//! ## Modules
//!
//! - `core`: Entity IDs, tokens, profiles, configuration
//! - `error`: Error taxonomy
//! - `clearance`: Observable lists, sources, registry
//! - `replication`: Deltas, snapshots, wire codec, bridge, transport
//! - `access`: Issuers, togglers, access requirements

pub mod core;
pub mod error;
pub mod clearance;
pub mod replication;
pub mod access;

// Re-export commonly used types
pub use crate::core::{
    EntityId,
    ClearanceToken, ClearanceVocabulary,
    ClearanceProfile, PopulationPolicy,
    ClearanceConfig,
};

pub use crate::error::{ClearanceError, ClearanceResult};

pub use crate::clearance::{
    ClearanceRegistry, ClearanceSet, ClearanceSource, Role,
    SetChange, SetOp, SubscriptionId,
};

pub use crate::replication::{
    ApplyOutcome, ClearanceDelta, ClearanceSnapshot,
    LocalTransport, ObserverId, ReplicationBridge, ReplicationMessage, ReplicationTransport,
};

pub use crate::access::{
    check_access, current_clearance_of, set_clearance_state,
    AccessRequirement, ClearanceHolders, ClearanceIssuer, ClearanceToggle, IssueMode, ToggleOutcome,
};
