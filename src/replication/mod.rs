//! Replication of clearance state from the authority to observers.
//!
//! ## Key Components
//!
//! - [`ClearanceDelta`] / [`ClearanceSnapshot`]: what travels
//! - [`WireDelta`] / [`WireMessage`]: the bincode wire form, raw codes
//! - [`ReplicationBridge`]: tracks observers and flushes pending deltas
//! - [`ReplicationTransport`]: the delivery contract the network must meet
//! - [`LocalTransport`]: in-process transport
//! - `ClearanceSource::apply_*`: observer-side replay
//!
//! ## Guarantees
//!
//! Per entity, observers apply operations in exactly the order the
//! authority produced them. A late joiner first receives a snapshot of
//! both sets, then only deltas newer than that snapshot take effect.
//! A lost delta is detected from the sequence numbers and repaired with a
//! resync snapshot. There is no ordering across entities.
//!
//! ## Example
//!
//! ```
//! use rust_clearance::clearance::ClearanceSource;
//! use rust_clearance::core::{ClearanceToken, EntityId};
//! use rust_clearance::replication::{LocalTransport, ObserverId, ReplicationBridge};
//!
//! const MAINTENANCE: ClearanceToken = ClearanceToken::new(1);
//! const BRIDGE: ClearanceToken = ClearanceToken::new(2);
//!
//! let card = EntityId::new(1);
//! let mut authority = ClearanceSource::authority(card);
//! let mut bridge = ReplicationBridge::new();
//! let mut transport = LocalTransport::new();
//!
//! authority.add_clearance(MAINTENANCE).unwrap();
//! authority.add_clearance(BRIDGE).unwrap();
//! authority.remove_clearance(MAINTENANCE).unwrap();
//! bridge.flush(&mut authority, &mut transport);
//!
//! // joins after the fact: snapshot only
//! let late = ObserverId::new(2);
//! let mut mirror = ClearanceSource::observer(card);
//! bridge.add_observer(&authority, late, &mut transport).unwrap();
//! transport.deliver(late, &mut mirror).unwrap();
//!
//! assert_eq!(mirror.issued_clearance().to_vec(), vec![BRIDGE]);
//! ```

mod bridge;
mod message;
mod mirror;
mod transport;

pub use bridge::{ObserverId, ReplicationBridge, ReplicationTransport};
pub use message::{ClearanceDelta, ClearanceSnapshot, ReplicationMessage, WireDelta, WireMessage};
pub use mirror::ApplyOutcome;
pub use transport::LocalTransport;
