//! Access requirements for doors, consoles and other locks.

use serde::{Deserialize, Serialize};

use crate::clearance::{ClearanceSet, ClearanceSource};
use crate::core::{ClearanceProfile, ClearanceToken};

/// What a lock demands of whoever tries it.
///
/// Checks are membership tests on the holder's active set; order and
/// duplicates don't matter. Absence of a token denies.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessRequirement {
    /// Anyone passes, with or without a clearance holder.
    #[default]
    Unrestricted,
    /// At least one of the tokens. An empty list admits nobody.
    AnyOf(Vec<ClearanceToken>),
    /// Every one of the tokens. An empty list admits any holder.
    AllOf(Vec<ClearanceToken>),
}

impl AccessRequirement {
    /// Require a single token.
    #[must_use]
    pub fn token(token: ClearanceToken) -> Self {
        AccessRequirement::AnyOf(vec![token])
    }

    /// Require any of the tokens.
    #[must_use]
    pub fn any_of(tokens: impl IntoIterator<Item = ClearanceToken>) -> Self {
        AccessRequirement::AnyOf(tokens.into_iter().collect())
    }

    /// Require all of the tokens.
    #[must_use]
    pub fn all_of(tokens: impl IntoIterator<Item = ClearanceToken>) -> Self {
        AccessRequirement::AllOf(tokens.into_iter().collect())
    }

    /// Check if a requirement needs no clearance at all.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, AccessRequirement::Unrestricted)
    }

    /// Check a set of tokens.
    #[must_use]
    pub fn allows(&self, clearance: &ClearanceSet) -> bool {
        match self {
            AccessRequirement::Unrestricted => true,
            AccessRequirement::AnyOf(tokens) => tokens.iter().any(|&t| clearance.contains(t)),
            AccessRequirement::AllOf(tokens) => tokens.iter().all(|&t| clearance.contains(t)),
        }
    }

    /// Check a holder, if there is one, under the active profile.
    #[must_use]
    pub fn is_satisfied_by(&self, holder: Option<&ClearanceSource>, profile: ClearanceProfile) -> bool {
        match holder {
            Some(source) => self.allows(source.current_clearance(profile)),
            None => self.is_unrestricted(),
        }
    }
}
