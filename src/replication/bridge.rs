//! Authority-side fan-out of clearance changes.
//!
//! The bridge remembers which observers watch which entity. On every sync
//! tick it drains each dirty source's pending deltas and sends them, in
//! order, to that entity's observers through a `ReplicationTransport`.
//! New observers get a full snapshot first, so they never depend on
//! history they did not see.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::clearance::{ClearanceRegistry, ClearanceSource};
use crate::core::EntityId;
use crate::error::ClearanceResult;

use super::message::ReplicationMessage;

/// Identifier of a remote observer (a connected client).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObserverId(pub u32);

impl ObserverId {
    /// Create a new observer ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Observer({})", self.0)
    }
}

/// Delivery contract the bridge needs from the network layer.
///
/// Implementations must deliver messages for the same (observer, entity)
/// pair reliably and in the order they were sent. Nothing is assumed
/// across entities.
pub trait ReplicationTransport {
    /// Queue one message for one observer.
    fn send(&mut self, observer: ObserverId, message: &ReplicationMessage) -> ClearanceResult<()>;
}

/// Tracks observers per entity and pushes changes to them.
///
/// ## Usage
///
/// ```
/// use rust_clearance::clearance::ClearanceSource;
/// use rust_clearance::core::{ClearanceToken, EntityId};
/// use rust_clearance::replication::{LocalTransport, ObserverId, ReplicationBridge};
///
/// let door = EntityId::new(3);
/// let client = ObserverId::new(1);
/// let mut authority = ClearanceSource::authority(door);
/// let mut mirror = ClearanceSource::observer(door);
/// let mut bridge = ReplicationBridge::new();
/// let mut transport = LocalTransport::new();
///
/// bridge.add_observer(&authority, client, &mut transport).unwrap();
/// authority.add_clearance(ClearanceToken::new(4)).unwrap();
/// bridge.flush(&mut authority, &mut transport);
///
/// transport.deliver(client, &mut mirror).unwrap();
/// assert_eq!(mirror.issued_clearance().to_vec(), vec![ClearanceToken::new(4)]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReplicationBridge {
    observers: FxHashMap<EntityId, SmallVec<[ObserverId; 4]>>,
}

impl ReplicationBridge {
    /// Create a bridge with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start replicating `source` to `observer`.
    ///
    /// Sends a snapshot of both sets first. An observer that was already
    /// watching (it reconnected before `disconnect`) gets a fresh snapshot
    /// too, and the call returns `Ok(false)`. If the snapshot can't be sent
    /// a new observer is not registered.
    pub fn add_observer<T>(
        &mut self,
        source: &ClearanceSource,
        observer: ObserverId,
        transport: &mut T,
    ) -> ClearanceResult<bool>
    where
        T: ReplicationTransport + ?Sized,
    {
        let entity = source.entity();
        transport.send(observer, &ReplicationMessage::Snapshot(source.snapshot()))?;
        if self.is_observing(entity, observer) {
            tracing::debug!(%entity, %observer, sequence = source.sequence(), "observer rejoined clearance replication");
            return Ok(false);
        }

        self.observers.entry(entity).or_default().push(observer);

        tracing::debug!(%entity, %observer, sequence = source.sequence(), "observer joined clearance replication");
        Ok(true)
    }

    /// Send a fresh snapshot to an observer whose mirror fell behind.
    pub fn resync<T>(
        &self,
        source: &ClearanceSource,
        observer: ObserverId,
        transport: &mut T,
    ) -> ClearanceResult<()>
    where
        T: ReplicationTransport + ?Sized,
    {
        tracing::debug!(entity = %source.entity(), %observer, "resyncing clearance mirror");
        transport.send(observer, &ReplicationMessage::Snapshot(source.snapshot()))
    }

    /// Stop replicating an entity to an observer.
    pub fn remove_observer(&mut self, entity: EntityId, observer: ObserverId) -> bool {
        let Some(list) = self.observers.get_mut(&entity) else {
            return false;
        };
        let before = list.len();
        list.retain(|o| *o != observer);
        let removed = list.len() != before;
        if list.is_empty() {
            self.observers.remove(&entity);
        }
        removed
    }

    /// Drop an observer from every entity (the client disconnected).
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.observers.retain(|_, list| {
            list.retain(|o| *o != observer);
            !list.is_empty()
        });
    }

    /// Forget every observer of an entity (the entity was destroyed).
    pub fn forget_entity(&mut self, entity: EntityId) {
        self.observers.remove(&entity);
    }

    /// Observers of an entity, in join order.
    #[must_use]
    pub fn observers(&self, entity: EntityId) -> &[ObserverId] {
        self.observers.get(&entity).map_or(&[], |list| list.as_slice())
    }

    /// Check if an observer watches an entity.
    #[must_use]
    pub fn is_observing(&self, entity: EntityId, observer: ObserverId) -> bool {
        self.observers(entity).contains(&observer)
    }

    /// Send a source's pending deltas to its observers.
    ///
    /// Drains the source even when nobody is watching: future observers
    /// start from a snapshot. A failed send is logged and skipped; that
    /// observer will see a sequence gap and ask for a resync.
    ///
    /// Returns the number of messages handed to the transport.
    pub fn flush<T>(&mut self, source: &mut ClearanceSource, transport: &mut T) -> usize
    where
        T: ReplicationTransport + ?Sized,
    {
        if !source.is_dirty() {
            return 0;
        }

        let entity = source.entity();
        let deltas = source.take_pending();
        let observers = self.observers(entity);

        let mut sent = 0;
        for delta in &deltas {
            let message = ReplicationMessage::Delta(*delta);
            for &observer in observers {
                match transport.send(observer, &message) {
                    Ok(()) => sent += 1,
                    Err(err) => tracing::warn!(
                        %entity,
                        %observer,
                        sequence = delta.sequence,
                        error = %err,
                        "failed to send clearance delta"
                    ),
                }
            }
        }

        tracing::debug!(
            %entity,
            deltas = deltas.len(),
            observers = observers.len(),
            sent,
            "flushed clearance deltas"
        );
        sent
    }

    /// Flush every dirty source in a registry.
    pub fn flush_registry<T>(&mut self, registry: &mut ClearanceRegistry, transport: &mut T) -> usize
    where
        T: ReplicationTransport + ?Sized,
    {
        registry
            .iter_mut()
            .filter(|source| source.is_dirty())
            .map(|source| self.flush(source, transport))
            .sum()
    }
}
