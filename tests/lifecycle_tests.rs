//! Source lifecycle integration tests.
//!
//! Initialize, shut down and re-initialize sources, and check the effect on
//! listeners, pending deltas and observers.

use std::sync::{Arc, Mutex};

use rust_clearance::clearance::{ClearanceRegistry, ClearanceSource, SetChange};
use rust_clearance::core::{ClearanceConfig, ClearanceProfile, ClearanceToken, EntityId};
use rust_clearance::error::ClearanceError;
use rust_clearance::replication::{LocalTransport, ObserverId, ReplicationBridge};

const MAINTENANCE: ClearanceToken = ClearanceToken::new(1);
const BRIDGE: ClearanceToken = ClearanceToken::new(2);
const ARMORY: ClearanceToken = ClearanceToken::new(3);

const CARD: EntityId = EntityId::new(3);

/// Test that initialize re-baselines both sets from the config.
#[test]
fn test_initialize_replaces_contents() {
    let mut source = ClearanceSource::authority(CARD);
    source.add_clearance(ARMORY).unwrap();
    source.add_low_pop_clearance(ARMORY).unwrap();

    let config = ClearanceConfig::new()
        .with_issued([MAINTENANCE, BRIDGE])
        .with_low_pop_issued([MAINTENANCE]);
    source.initialize(config.clone()).unwrap();

    assert_eq!(source.issued_clearance().to_vec(), vec![MAINTENANCE, BRIDGE]);
    assert_eq!(source.low_pop_issued_clearance().to_vec(), vec![MAINTENANCE]);
    assert_eq!(source.config(), &config);
}

/// Test that initialize is observable as clear-then-append.
#[test]
fn test_initialize_notifies_clear_then_adds() {
    let mut source = ClearanceSource::authority(CARD);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    source.subscribe(ClearanceProfile::Normal, move |change| {
        sink.lock().unwrap().push(*change);
    });

    source
        .initialize(ClearanceConfig::new().with_issued([BRIDGE]))
        .unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[SetChange::Clear, SetChange::Add { index: 0, token: BRIDGE }]
    );
}

/// Test that an observer keeps its replicated contents on initialize.
#[test]
fn test_observer_initialize_keeps_contents() {
    let mut authority = ClearanceSource::authority(CARD);
    authority.add_clearance(BRIDGE).unwrap();

    let mut mirror = ClearanceSource::observer(CARD);
    mirror.apply_snapshot(&authority.snapshot()).unwrap();
    mirror
        .initialize(ClearanceConfig::new().with_issued([ARMORY]))
        .unwrap();

    assert_eq!(mirror.issued_clearance().to_vec(), vec![BRIDGE]);
    assert!(!mirror.is_dirty());
}

/// Test that a shut-down source rejects writes until re-initialized.
#[test]
fn test_shutdown_then_reinitialize() {
    let mut source = ClearanceSource::authority(CARD);
    source.add_clearance(BRIDGE).unwrap();

    let calls = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&calls);
    source.subscribe(ClearanceProfile::Normal, move |_| *sink.lock().unwrap() += 1);

    source.shutdown();
    assert!(source.is_shut_down());
    assert!(!source.is_authority());
    assert!(!source.is_dirty());

    let err = source.add_clearance(ARMORY).unwrap_err();
    assert!(matches!(err, ClearanceError::NotAuthorized { .. }));
    // state survives shutdown, only writes stop
    assert_eq!(source.issued_clearance().to_vec(), vec![BRIDGE]);

    source.initialize(ClearanceConfig::new()).unwrap();
    source.add_clearance(ARMORY).unwrap();

    assert_eq!(source.issued_clearance().to_vec(), vec![ARMORY]);
    assert_eq!(*calls.lock().unwrap(), 0);
}

/// Test that the sequence keeps counting across a shutdown.
#[test]
fn test_sequence_survives_shutdown() {
    let mut authority = ClearanceSource::authority(CARD);
    let mut bridge = ReplicationBridge::new();
    let mut transport = LocalTransport::new();
    let client = ObserverId::new(1);
    let mut mirror = ClearanceSource::observer(CARD);

    bridge.add_observer(&authority, client, &mut transport).unwrap();
    authority.add_clearance(BRIDGE).unwrap();
    bridge.flush(&mut authority, &mut transport);
    transport.deliver(client, &mut mirror).unwrap();
    let before = authority.sequence();

    // unflushed deltas are lost on shutdown
    authority.add_clearance(ARMORY).unwrap();
    authority.shutdown();
    authority
        .initialize(ClearanceConfig::new().with_issued([MAINTENANCE]))
        .unwrap();
    assert!(authority.sequence() > before + 1);

    bridge.flush(&mut authority, &mut transport);
    let err = transport.deliver(client, &mut mirror).unwrap_err();
    assert!(matches!(err, ClearanceError::ReplicationGap { .. }));

    transport.take(client, CARD);
    bridge.resync(&authority, client, &mut transport).unwrap();
    transport.deliver(client, &mut mirror).unwrap();
    assert_eq!(mirror.issued_clearance().to_vec(), vec![MAINTENANCE]);
}

/// Test that removing an entity from the registry drops its holder.
#[test]
fn test_entity_destroyed() {
    let mut world = ClearanceRegistry::new();
    let mut bridge = ReplicationBridge::new();
    let mut transport = LocalTransport::new();

    world.spawn_authority(CARD, ClearanceConfig::new()).unwrap();
    bridge
        .add_observer(world.get(CARD).unwrap(), ObserverId::new(1), &mut transport)
        .unwrap();

    let mut source = world.remove(CARD).unwrap();
    source.shutdown();
    bridge.forget_entity(CARD);

    assert!(world.is_empty());
    assert!(bridge.observers(CARD).is_empty());
}
