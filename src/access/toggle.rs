//! Turning a single token on or off.
//!
//! This is the console pattern: read the active set, compare with the
//! desired state, and write only when they differ. Repeating a request is
//! free and writes nothing.

use serde::{Deserialize, Serialize};

use crate::clearance::ClearanceSource;
use crate::core::{ClearanceProfile, ClearanceToken};
use crate::error::ClearanceResult;

/// What a toggle request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToggleOutcome {
    /// Already in the requested state.
    Unchanged,
    /// The token was added.
    Granted,
    /// The first occurrence of the token was removed.
    Revoked,
}

impl ToggleOutcome {
    /// Check if the request wrote anything.
    #[must_use]
    pub fn changed(self) -> bool {
        !matches!(self, ToggleOutcome::Unchanged)
    }
}

/// Bring `token` to the requested state in the active profile's set.
///
/// Issues at most one add or remove. With duplicate entries, turning a
/// token off removes only the first one.
pub fn set_clearance_state(
    source: &mut ClearanceSource,
    profile: ClearanceProfile,
    token: ClearanceToken,
    enabled: bool,
) -> ClearanceResult<ToggleOutcome> {
    let present = source.current_clearance(profile).contains(token);

    let outcome = match (present, enabled) {
        (true, true) | (false, false) => ToggleOutcome::Unchanged,
        (false, true) => {
            source.add_for(profile, token)?;
            ToggleOutcome::Granted
        }
        (true, false) => {
            source.remove_for(profile, token)?;
            ToggleOutcome::Revoked
        }
    };

    if outcome.changed() {
        tracing::debug!(
            entity = %source.entity(),
            %token,
            %profile,
            ?outcome,
            "clearance toggled"
        );
    }
    Ok(outcome)
}

/// One console button bound to one token.
///
/// ```
/// use rust_clearance::access::{ClearanceToggle, ToggleOutcome};
/// use rust_clearance::clearance::ClearanceSource;
/// use rust_clearance::core::{ClearanceProfile, ClearanceToken, EntityId};
///
/// let armory = ClearanceToggle::new(ClearanceToken::new(3));
/// let mut card = ClearanceSource::authority(EntityId::new(1));
///
/// let on = armory.set(&mut card, ClearanceProfile::Normal, true).unwrap();
/// let again = armory.set(&mut card, ClearanceProfile::Normal, true).unwrap();
/// assert_eq!((on, again), (ToggleOutcome::Granted, ToggleOutcome::Unchanged));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceToggle {
    /// The token this button controls.
    pub token: ClearanceToken,
}

impl ClearanceToggle {
    /// Create a toggle for a token.
    #[must_use]
    pub const fn new(token: ClearanceToken) -> Self {
        Self { token }
    }

    /// State to display for a holder (`false` if there is none).
    #[must_use]
    pub fn is_on(&self, holder: Option<&ClearanceSource>, profile: ClearanceProfile) -> bool {
        holder.is_some_and(|source| source.has_clearance(self.token, profile))
    }

    /// Bring the token to `enabled`.
    pub fn set(
        &self,
        source: &mut ClearanceSource,
        profile: ClearanceProfile,
        enabled: bool,
    ) -> ClearanceResult<ToggleOutcome> {
        set_clearance_state(source, profile, self.token, enabled)
    }

    /// Flip the token.
    pub fn flip(
        &self,
        source: &mut ClearanceSource,
        profile: ClearanceProfile,
    ) -> ClearanceResult<ToggleOutcome> {
        let enabled = !source.has_clearance(self.token, profile);
        self.set(source, profile, enabled)
    }
}
