//! Observer-side application of replicated state.
//!
//! A mirror is a `ClearanceSource` with `Role::Observer`. It tracks the
//! sequence of the last operation it applied:
//!
//! - a snapshot always replaces both sets and takes over its sequence,
//!   even a lower one (the authority was re-created)
//! - a delta at or below the current sequence is stale (the snapshot
//!   already covered it) and is dropped
//! - the next delta in line is replayed on the matching set
//! - a delta further ahead means something was lost; the mirror is left
//!   as it was and flagged for a resync snapshot
//!
//! Replays go through the regular `ClearanceSet` operations, so listeners
//! registered on the mirror see the same change stream the authority's
//! listeners saw.

use crate::clearance::{ClearanceSource, Role};
use crate::core::{ClearanceProfile, EntityId};
use crate::error::{ClearanceError, ClearanceResult};

use super::message::{ClearanceDelta, ClearanceSnapshot, ReplicationMessage};

/// What happened to an incoming message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The mirror changed (or advanced past a no-op `Set`).
    Applied,
    /// The delta was older than the mirror's state and was dropped.
    Stale,
}

impl ClearanceSource {
    /// Replace the mirror's contents with a snapshot.
    ///
    /// Never stale: a transport delivers in order, so a snapshot is always
    /// the authority's latest word. Listeners see a `Clear` followed by one `Add` per token, per set.
    pub fn apply_snapshot(&mut self, snapshot: &ClearanceSnapshot) -> ClearanceResult<ApplyOutcome> {
        self.check_replica(snapshot.entity)?;

        if snapshot.sequence < self.sequence() {
            // the authority was re-created and restarted its numbering
            tracing::debug!(
                entity = %snapshot.entity,
                snapshot = snapshot.sequence,
                current = self.sequence(),
                "clearance snapshot rewinds mirror sequence"
            );
        }

        for profile in ClearanceProfile::ALL {
            let tokens = snapshot.tokens_for(profile).clone();
            self.set_mut(profile).replace_all(tokens);
        }
        self.mark_synced(snapshot.sequence);

        tracing::debug!(
            entity = %snapshot.entity,
            sequence = snapshot.sequence,
            issued = snapshot.issued.len(),
            low_pop_issued = snapshot.low_pop_issued.len(),
            "applied clearance snapshot"
        );
        Ok(ApplyOutcome::Applied)
    }

    /// Replay one authoritative operation.
    pub fn apply_delta(&mut self, delta: &ClearanceDelta) -> ClearanceResult<ApplyOutcome> {
        self.check_replica(delta.entity)?;

        let current = self.sequence();
        if delta.sequence <= current {
            tracing::trace!(
                entity = %delta.entity,
                sequence = delta.sequence,
                current,
                "dropping stale clearance delta"
            );
            return Ok(ApplyOutcome::Stale);
        }

        let expected = current + 1;
        if delta.sequence != expected {
            self.flag_resync();
            tracing::warn!(
                entity = %delta.entity,
                expected,
                received = delta.sequence,
                "clearance replication gap, mirror needs resync"
            );
            return Err(ClearanceError::ReplicationGap {
                entity: delta.entity,
                expected,
                received: delta.sequence,
            });
        }

        if let Err(err) = self.set_mut(delta.profile).apply(&delta.change) {
            // the mirror has diverged from the authority
            self.flag_resync();
            tracing::warn!(
                entity = %delta.entity,
                sequence = delta.sequence,
                error = %err,
                "clearance delta did not apply, mirror needs resync"
            );
            return Err(err);
        }
        self.mark_synced(delta.sequence);

        tracing::trace!(
            entity = %delta.entity,
            sequence = delta.sequence,
            profile = %delta.profile,
            op = ?delta.change.op(),
            "applied clearance delta"
        );
        Ok(ApplyOutcome::Applied)
    }

    /// Apply either kind of message.
    pub fn apply_message(&mut self, message: &ReplicationMessage) -> ClearanceResult<ApplyOutcome> {
        match message {
            ReplicationMessage::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            ReplicationMessage::Delta(delta) => self.apply_delta(delta),
        }
    }

    /// Decode and apply an encoded message.
    ///
    /// Undecodable messages (unknown operation codes included) leave the
    /// mirror untouched.
    pub fn apply_bytes(&mut self, bytes: &[u8]) -> ClearanceResult<ApplyOutcome> {
        let message = match ReplicationMessage::decode(bytes) {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(
                    entity = %self.entity(),
                    error = %err,
                    "rejected clearance replication message"
                );
                return Err(err);
            }
        };
        self.apply_message(&message)
    }

    fn check_replica(&self, received: EntityId) -> ClearanceResult<()> {
        if self.role() == Role::Authority {
            return Err(ClearanceError::AuthorityReplay { entity: self.entity() });
        }
        if received != self.entity() {
            return Err(ClearanceError::EntityMismatch {
                entity: self.entity(),
                received,
            });
        }
        Ok(())
    }
}
