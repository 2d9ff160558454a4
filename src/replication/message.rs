//! Replication messages and their wire form.
//!
//! Two messages cross the wire:
//!
//! - `Delta`: one set operation, as the tuple
//!   `(entity, sequence, set, op, index, old, new)`
//! - `Snapshot`: both sets of one entity in full, for late joiners and
//!   resyncs
//!
//! The typed forms (`ClearanceDelta`, `ReplicationMessage`) are what the
//! rest of the crate works with. The wire forms (`WireDelta`,
//! `WireMessage`) keep raw codes so a build can receive operations it does
//! not understand and reject them cleanly instead of failing to decode.
//!
//! Encoding is bincode.
//!
//! ## Operation codes
//!
//! | op       | code |
//! |----------|------|
//! | Add      | 0    |
//! | Insert   | 1    |
//! | RemoveAt | 2    |
//! | Clear    | 3    |
//! | Set      | 4    |

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::clearance::{SetChange, SetOp};
use crate::core::{ClearanceProfile, ClearanceToken, EntityId};
use crate::error::{ClearanceError, ClearanceResult};

/// One authoritative set operation, tagged with its position in the
/// entity's operation stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearanceDelta {
    /// Entity whose clearance changed.
    pub entity: EntityId,

    /// Per-entity sequence number, starting at 1, without gaps.
    pub sequence: u64,

    /// Which of the two sets changed.
    pub profile: ClearanceProfile,

    /// The operation itself.
    pub change: SetChange,
}

impl ClearanceDelta {
    /// Flatten into the wire tuple.
    ///
    /// Fails if the index does not fit the wire's `u32`.
    pub fn to_wire(&self) -> ClearanceResult<WireDelta> {
        let index = self.change.index();
        let wire_index = u32::try_from(index).map_err(|_| ClearanceError::WireIndexOverflow {
            entity: self.entity,
            sequence: self.sequence,
            index,
        })?;

        Ok(WireDelta {
            entity: self.entity.raw(),
            sequence: self.sequence,
            set: self.profile.code(),
            op: self.change.op().code(),
            index: wire_index,
            old: self.change.old_token().map(ClearanceToken::raw),
            new: self.change.new_token().map(ClearanceToken::raw),
        })
    }

    /// Rebuild from the wire tuple.
    ///
    /// Fails on unknown op or set codes, and on operations missing the
    /// token they need.
    pub fn from_wire(wire: &WireDelta) -> ClearanceResult<Self> {
        let entity = EntityId::new(wire.entity);
        let op = SetOp::from_code(wire.op)?;
        let profile = ClearanceProfile::from_code(wire.set)?;
        let index = wire.index as usize;

        let malformed = || ClearanceError::MalformedDelta {
            entity,
            sequence: wire.sequence,
        };
        let old = || wire.old.map(ClearanceToken::new).ok_or_else(malformed);
        let new = || wire.new.map(ClearanceToken::new).ok_or_else(malformed);

        let change = match op {
            SetOp::Add => SetChange::Add { index, token: new()? },
            SetOp::Insert => SetChange::Insert { index, token: new()? },
            SetOp::RemoveAt => SetChange::RemoveAt { index, removed: old()? },
            SetOp::Clear => SetChange::Clear,
            SetOp::Set => SetChange::Set {
                index,
                old: old()?,
                new: new()?,
            },
        };

        Ok(Self {
            entity,
            sequence: wire.sequence,
            profile,
            change,
        })
    }
}

/// Full state of one entity's clearance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceSnapshot {
    /// Entity the snapshot describes.
    pub entity: EntityId,

    /// Sequence of the last delta folded into this snapshot.
    pub sequence: u64,

    /// Normal-population tokens, in order.
    pub issued: Vector<ClearanceToken>,

    /// Low-population tokens, in order.
    pub low_pop_issued: Vector<ClearanceToken>,
}

impl ClearanceSnapshot {
    /// Tokens of one profile.
    #[must_use]
    pub fn tokens_for(&self, profile: ClearanceProfile) -> &Vector<ClearanceToken> {
        match profile {
            ClearanceProfile::Normal => &self.issued,
            ClearanceProfile::LowPop => &self.low_pop_issued,
        }
    }
}

/// Wire form of a delta: raw codes, nothing validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDelta {
    pub entity: u32,
    pub sequence: u64,
    pub set: u8,
    pub op: u8,
    pub index: u32,
    pub old: Option<u16>,
    pub new: Option<u16>,
}

/// Wire envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMessage {
    Snapshot(ClearanceSnapshot),
    Delta(WireDelta),
}

impl WireMessage {
    /// Encode with bincode.
    pub fn encode(&self) -> ClearanceResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode with bincode. Codes are not checked here.
    pub fn decode(bytes: &[u8]) -> ClearanceResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Message from the authority to one observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicationMessage {
    /// Full state; replaces whatever the mirror holds.
    Snapshot(ClearanceSnapshot),
    /// One incremental operation.
    Delta(ClearanceDelta),
}

impl ReplicationMessage {
    /// Entity the message is about.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        match self {
            ReplicationMessage::Snapshot(snapshot) => snapshot.entity,
            ReplicationMessage::Delta(delta) => delta.entity,
        }
    }

    /// Sequence number carried by the message.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        match self {
            ReplicationMessage::Snapshot(snapshot) => snapshot.sequence,
            ReplicationMessage::Delta(delta) => delta.sequence,
        }
    }

    /// Convert to the wire envelope.
    pub fn to_wire(&self) -> ClearanceResult<WireMessage> {
        match self {
            ReplicationMessage::Snapshot(snapshot) => Ok(WireMessage::Snapshot(snapshot.clone())),
            ReplicationMessage::Delta(delta) => delta.to_wire().map(WireMessage::Delta),
        }
    }

    /// Validate a wire envelope.
    pub fn from_wire(wire: &WireMessage) -> ClearanceResult<Self> {
        match wire {
            WireMessage::Snapshot(snapshot) => Ok(ReplicationMessage::Snapshot(snapshot.clone())),
            WireMessage::Delta(delta) => ClearanceDelta::from_wire(delta).map(ReplicationMessage::Delta),
        }
    }

    /// Encode to bytes.
    pub fn encode(&self) -> ClearanceResult<Vec<u8>> {
        self.to_wire()?.encode()
    }

    /// Decode and validate bytes.
    pub fn decode(bytes: &[u8]) -> ClearanceResult<Self> {
        Self::from_wire(&WireMessage::decode(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRIDGE: ClearanceToken = ClearanceToken::new(2);
    const ARMORY: ClearanceToken = ClearanceToken::new(3);

    fn delta(change: SetChange) -> ClearanceDelta {
        ClearanceDelta {
            entity: EntityId(12),
            sequence: 4,
            profile: ClearanceProfile::LowPop,
            change,
        }
    }

    #[test]
    fn test_wire_tuple_layout() {
        let wire = delta(SetChange::RemoveAt { index: 1, removed: ARMORY }).to_wire().unwrap();

        assert_eq!(
            wire,
            WireDelta {
                entity: 12,
                sequence: 4,
                set: 1,
                op: 2,
                index: 1,
                old: Some(3),
                new: None,
            }
        );
    }

    #[test]
    fn test_every_op_survives_the_wire() {
        let changes = [
            SetChange::Add { index: 0, token: BRIDGE },
            SetChange::Insert { index: 2, token: ARMORY },
            SetChange::RemoveAt { index: 1, removed: BRIDGE },
            SetChange::Clear,
            SetChange::Set { index: 0, old: BRIDGE, new: ARMORY },
        ];
        for change in changes {
            let message = ReplicationMessage::Delta(delta(change));
            let bytes = message.encode().unwrap();
            assert_eq!(ReplicationMessage::decode(&bytes).unwrap(), message);
        }
    }

    #[test]
    fn test_snapshot_encoding() {
        let message = ReplicationMessage::Snapshot(ClearanceSnapshot {
            entity: EntityId(3),
            sequence: 9,
            issued: Vector::from(vec![BRIDGE, ARMORY]),
            low_pop_issued: Vector::new(),
        });

        let decoded = ReplicationMessage::decode(&message.encode().unwrap()).unwrap();
        assert_eq!(decoded, message);
        assert_eq!(decoded.entity(), EntityId(3));
        assert_eq!(decoded.sequence(), 9);
    }

    #[test]
    fn test_index_beyond_wire_range_is_rejected() {
        let Ok(index) = usize::try_from(u64::from(u32::MAX) + 1) else {
            // usize is 32 bits here; such an index cannot exist
            return;
        };
        let message = ReplicationMessage::Delta(delta(SetChange::Insert { index, token: BRIDGE }));

        assert!(matches!(
            message.encode(),
            Err(ClearanceError::WireIndexOverflow { sequence: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_op_code_rejected() {
        let mut wire = delta(SetChange::Clear).to_wire().unwrap();
        wire.op = 17;
        let bytes = WireMessage::Delta(wire).encode().unwrap();

        assert!(matches!(
            ReplicationMessage::decode(&bytes),
            Err(ClearanceError::UnknownReplicationOperation { code: 17 })
        ));
    }

    #[test]
    fn test_unknown_set_code_rejected() {
        let mut wire = delta(SetChange::Clear).to_wire().unwrap();
        wire.set = 5;

        assert!(matches!(
            ClearanceDelta::from_wire(&wire),
            Err(ClearanceError::UnknownProfile { code: 5 })
        ));
    }

    #[test]
    fn test_missing_token_is_malformed() {
        let mut wire = delta(SetChange::Add { index: 0, token: BRIDGE }).to_wire().unwrap();
        wire.new = None;

        assert!(matches!(
            ClearanceDelta::from_wire(&wire),
            Err(ClearanceError::MalformedDelta { sequence: 4, .. })
        ));
    }

    #[test]
    fn test_garbage_bytes_are_codec_errors() {
        assert!(matches!(
            ReplicationMessage::decode(&[0xff, 0xff, 0xff]),
            Err(ClearanceError::Codec(_))
        ));
    }
}
