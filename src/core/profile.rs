//! Population profiles.
//!
//! Every clearance holder carries two independent token lists: one for
//! normal population and one used while the server is running in
//! low-population mode. Which one is active is a game-wide decision made
//! from the live player count; consumers receive it as an explicit
//! `ClearanceProfile` argument instead of reading ambient state.

use serde::{Deserialize, Serialize};

use crate::error::{ClearanceError, ClearanceResult};

/// Which of a holder's two clearance sets is meant.
///
/// Also identifies the set on the replication wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClearanceProfile {
    /// Normal population (the `issued` set).
    #[default]
    Normal,
    /// Low-population mode (the `low_pop_issued` set).
    LowPop,
}

impl ClearanceProfile {
    /// Both profiles, in wire-code order.
    pub const ALL: [ClearanceProfile; 2] = [ClearanceProfile::Normal, ClearanceProfile::LowPop];

    /// Wire code for this profile.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            ClearanceProfile::Normal => 0,
            ClearanceProfile::LowPop => 1,
        }
    }

    /// Decode a wire code.
    pub fn from_code(code: u8) -> ClearanceResult<Self> {
        match code {
            0 => Ok(ClearanceProfile::Normal),
            1 => Ok(ClearanceProfile::LowPop),
            _ => Err(ClearanceError::UnknownProfile { code }),
        }
    }
}

impl std::fmt::Display for ClearanceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClearanceProfile::Normal => write!(f, "normal"),
            ClearanceProfile::LowPop => write!(f, "low-pop"),
        }
    }
}

/// Decides the active profile from the live player count.
///
/// Low-population mode is active while `player_count < low_pop_threshold`.
/// The default threshold of 0 never activates it.
///
/// ```
/// use rust_clearance::core::{ClearanceProfile, PopulationPolicy};
///
/// let policy = PopulationPolicy::new(10);
/// assert_eq!(policy.profile_for(4), ClearanceProfile::LowPop);
/// assert_eq!(policy.profile_for(10), ClearanceProfile::Normal);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PopulationPolicy {
    /// Player count at or above which the normal profile applies.
    pub low_pop_threshold: usize,
}

impl PopulationPolicy {
    /// Create a policy with the given low-pop threshold.
    #[must_use]
    pub const fn new(low_pop_threshold: usize) -> Self {
        Self { low_pop_threshold }
    }

    /// Active profile for a player count.
    #[must_use]
    pub const fn profile_for(&self, player_count: usize) -> ClearanceProfile {
        if player_count < self.low_pop_threshold {
            ClearanceProfile::LowPop
        } else {
            ClearanceProfile::Normal
        }
    }
}
