//! In-process transport.
//!
//! `LocalTransport` encodes every message and queues the bytes per
//! (observer, entity) pair, which is exactly the ordering guarantee the
//! bridge asks for. Used by single-process hosts, tests and benches; a
//! networked game plugs its own `ReplicationTransport` in instead.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::clearance::ClearanceSource;
use crate::core::EntityId;
use crate::error::ClearanceResult;

use super::bridge::{ObserverId, ReplicationTransport};
use super::message::ReplicationMessage;
use super::mirror::ApplyOutcome;

/// Per-(observer, entity) FIFO queues of encoded messages.
#[derive(Clone, Debug, Default)]
pub struct LocalTransport {
    queues: FxHashMap<(ObserverId, EntityId), VecDeque<Vec<u8>>>,
    bytes_sent: usize,
}

impl LocalTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued messages for an observer and entity.
    #[must_use]
    pub fn pending(&self, observer: ObserverId, entity: EntityId) -> usize {
        self.queues.get(&(observer, entity)).map_or(0, VecDeque::len)
    }

    /// Total encoded bytes ever queued.
    #[must_use]
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Queue raw bytes, bypassing encoding.
    pub fn push_raw(&mut self, observer: ObserverId, entity: EntityId, bytes: Vec<u8>) {
        self.bytes_sent += bytes.len();
        self.queues.entry((observer, entity)).or_default().push_back(bytes);
    }

    /// Drop the oldest queued message, as a lossy link would.
    pub fn drop_next(&mut self, observer: ObserverId, entity: EntityId) -> Option<Vec<u8>> {
        self.queues.get_mut(&(observer, entity))?.pop_front()
    }

    /// Take every queued message for an observer and entity.
    pub fn take(&mut self, observer: ObserverId, entity: EntityId) -> Vec<Vec<u8>> {
        self.queues
            .remove(&(observer, entity))
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Apply everything queued for `observer` about `mirror`'s entity.
    ///
    /// Stops at the first message that fails to apply; it is consumed and
    /// later messages stay queued. Returns how many messages changed the
    /// mirror.
    pub fn deliver(&mut self, observer: ObserverId, mirror: &mut ClearanceSource) -> ClearanceResult<usize> {
        let Some(queue) = self.queues.get_mut(&(observer, mirror.entity())) else {
            return Ok(0);
        };

        let mut applied = 0;
        while let Some(bytes) = queue.pop_front() {
            if mirror.apply_bytes(&bytes)? == ApplyOutcome::Applied {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

impl ReplicationTransport for LocalTransport {
    fn send(&mut self, observer: ObserverId, message: &ReplicationMessage) -> ClearanceResult<()> {
        let bytes = message.encode()?;
        self.push_raw(observer, message.entity(), bytes);
        Ok(())
    }
}
