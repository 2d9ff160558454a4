//! World-level lookup of clearance holders.
//!
//! The registry maps entities to their `ClearanceSource`. Entities without
//! clearance (a crate, a wall) simply have no entry; consumers must treat
//! a missing holder as "no access", never as an error that aborts them.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use super::source::ClearanceSource;
use crate::core::{ClearanceConfig, EntityId};
use crate::error::ClearanceResult;

/// Clearance holders of one process, keyed by entity.
#[derive(Debug, Default)]
pub struct ClearanceRegistry {
    sources: FxHashMap<EntityId, ClearanceSource>,
}

impl ClearanceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, returning the one it replaced.
    pub fn insert(&mut self, source: ClearanceSource) -> Option<ClearanceSource> {
        self.sources.insert(source.entity(), source)
    }

    /// Create and initialize the authority for an entity.
    ///
    /// Replaces any existing source for that entity.
    pub fn spawn_authority(
        &mut self,
        entity: EntityId,
        config: ClearanceConfig,
    ) -> ClearanceResult<&mut ClearanceSource> {
        let mut source = ClearanceSource::authority(entity);
        source.initialize(config)?;
        Ok(self.put(source))
    }

    /// Create an observer mirror for an entity.
    ///
    /// Replaces any existing source for that entity.
    pub fn spawn_observer(&mut self, entity: EntityId) -> &mut ClearanceSource {
        self.put(ClearanceSource::observer(entity))
    }

    /// Remove an entity's source (the entity was destroyed).
    pub fn remove(&mut self, entity: EntityId) -> Option<ClearanceSource> {
        self.sources.remove(&entity)
    }

    /// Get a source by entity.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&ClearanceSource> {
        self.sources.get(&entity)
    }

    /// Get a mutable source by entity.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut ClearanceSource> {
        self.sources.get_mut(&entity)
    }

    /// Check if an entity has a source.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.sources.contains_key(&entity)
    }

    /// Number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Registered entities in ascending order.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<_> = self.sources.keys().copied().collect();
        entities.sort_unstable();
        entities
    }

    /// Iterate all sources.
    pub fn iter(&self) -> impl Iterator<Item = &ClearanceSource> {
        self.sources.values()
    }

    /// Iterate all sources mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClearanceSource> {
        self.sources.values_mut()
    }

    fn put(&mut self, source: ClearanceSource) -> &mut ClearanceSource {
        match self.sources.entry(source.entity()) {
            Entry::Occupied(mut slot) => {
                slot.insert(source);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearance::Role;
    use crate::core::{ClearanceProfile, ClearanceToken};

    const BRIDGE: ClearanceToken = ClearanceToken::new(2);

    #[test]
    fn test_spawn_authority_initializes() {
        let mut registry = ClearanceRegistry::new();
        let source = registry
            .spawn_authority(EntityId(5), ClearanceConfig::new().with_issued([BRIDGE]))
            .unwrap();

        assert!(source.has_clearance(BRIDGE, ClearanceProfile::Normal));
        assert!(source.is_dirty());
        assert!(registry.contains(EntityId(5)));
    }

    #[test]
    fn test_spawn_observer() {
        let mut registry = ClearanceRegistry::new();
        registry.spawn_observer(EntityId(5));

        assert_eq!(registry.get(EntityId(5)).map(ClearanceSource::role), Some(Role::Observer));
    }

    #[test]
    fn test_spawn_replaces() {
        let mut registry = ClearanceRegistry::new();
        registry.spawn_observer(EntityId(1));
        registry.spawn_authority(EntityId(1), ClearanceConfig::new()).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(EntityId(1)).map(ClearanceSource::role), Some(Role::Authority));
    }

    #[test]
    fn test_remove_and_entities() {
        let mut registry = ClearanceRegistry::new();
        registry.insert(ClearanceSource::authority(EntityId(9)));
        registry.insert(ClearanceSource::authority(EntityId(2)));
        registry.insert(ClearanceSource::observer(EntityId(4)));

        assert_eq!(registry.entities(), vec![EntityId(2), EntityId(4), EntityId(9)]);

        assert!(registry.remove(EntityId(4)).is_some());
        assert!(registry.remove(EntityId(4)).is_none());
        assert_eq!(registry.len(), 2);
        assert!(registry.get(EntityId(4)).is_none());
    }
}
