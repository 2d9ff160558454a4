//! Entity identification.
//!
//! Every game object that can carry clearance (ID card, door, console,
//! character) is addressed by an `EntityId`. The id is assigned by the host
//! world; this crate never allocates ids itself, it only keys clearance
//! holders and replication traffic by them.
//!
//! ## Usage
//!
//! ```
//! use rust_clearance::core::EntityId;
//!
//! let card = EntityId::new(10);
//! assert_eq!(card.raw(), 10);
//! assert_eq!(format!("{}", card), "Entity(10)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a game entity.
///
/// Opaque to the clearance core: the host world decides what the number
/// means. Equality and hashing are by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create a new entity ID.
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

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(EntityId::from(42), id);
    }

    #[test]
    fn test_ordering() {
        assert!(EntityId(1) < EntityId(2));
        assert_eq!(EntityId(7).max(EntityId(3)), EntityId(7));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EntityId(42)), "Entity(42)");
    }

    #[test]
    fn test_serialization() {
        let id = EntityId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
