//! Consumers of clearance: issuers, togglers and access checks.
//!
//! Consumers never own clearance state. They locate a target's
//! `ClearanceSource` through [`ClearanceHolders`] and act only through its
//! public API:
//!
//! - [`ClearanceIssuer`]: writes a fixed grant onto a target at a trigger
//!   (character spawn, ID card printed)
//! - [`ClearanceToggle`]: one console button, turns a token on or off
//!   without redundant writes
//! - [`AccessRequirement`]: what a door or console demands
//!
//! A target without a holder is never fatal: issuers log and skip, checks
//! deny.
//!
//! ## Example
//!
//! ```
//! use rust_clearance::access::{AccessRequirement, ClearanceIssuer, check_access};
//! use rust_clearance::clearance::ClearanceRegistry;
//! use rust_clearance::core::{ClearanceConfig, ClearanceProfile, ClearanceToken, EntityId};
//!
//! const ENGINEERING: ClearanceToken = ClearanceToken::new(1);
//! const BRIDGE: ClearanceToken = ClearanceToken::new(2);
//!
//! let mut world = ClearanceRegistry::new();
//! let card = EntityId::new(100);
//! world.spawn_authority(card, ClearanceConfig::new()).unwrap();
//!
//! let engineer = ClearanceIssuer::replace([ENGINEERING]);
//! engineer.issue(&mut world, card).unwrap();
//!
//! let door = AccessRequirement::any_of([ENGINEERING, BRIDGE]);
//! assert!(check_access(&world, card, &door, ClearanceProfile::Normal));
//! assert!(!check_access(&world, EntityId::new(5), &door, ClearanceProfile::Normal));
//! ```

mod issuer;
mod requirement;
mod toggle;

pub use issuer::{ClearanceIssuer, IssueMode};
pub use requirement::AccessRequirement;
pub use toggle::{set_clearance_state, ClearanceToggle, ToggleOutcome};

use crate::clearance::{ClearanceRegistry, ClearanceSet, ClearanceSource};
use crate::core::{ClearanceProfile, EntityId};

/// Anything that can locate an entity's clearance holder.
pub trait ClearanceHolders {
    /// The holder for `entity`, if it has one.
    fn clearance_of(&self, entity: EntityId) -> Option<&ClearanceSource>;

    /// Mutable access to the holder for `entity`, if it has one.
    fn clearance_of_mut(&mut self, entity: EntityId) -> Option<&mut ClearanceSource>;
}

impl ClearanceHolders for ClearanceRegistry {
    fn clearance_of(&self, entity: EntityId) -> Option<&ClearanceSource> {
        self.get(entity)
    }

    fn clearance_of_mut(&mut self, entity: EntityId) -> Option<&mut ClearanceSource> {
        self.get_mut(entity)
    }
}

/// Active clearance of a target, or `None` if it has no holder.
pub fn current_clearance_of<H>(
    holders: &H,
    entity: EntityId,
    profile: ClearanceProfile,
) -> Option<&ClearanceSet>
where
    H: ClearanceHolders + ?Sized,
{
    holders
        .clearance_of(entity)
        .map(|source| source.current_clearance(profile))
}

/// Check a target against a requirement.
///
/// A target without a holder only passes unrestricted requirements.
pub fn check_access<H>(
    holders: &H,
    entity: EntityId,
    requirement: &AccessRequirement,
    profile: ClearanceProfile,
) -> bool
where
    H: ClearanceHolders + ?Sized,
{
    requirement.is_satisfied_by(holders.clearance_of(entity), profile)
}
