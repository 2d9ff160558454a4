//! Designer-assigned clearance defaults.
//!
//! Each clearance holder is configured with the tokens it starts with, one
//! list per population profile. The authority pushes these lists into its
//! live sets when the holder is initialized, so every life cycle starts
//! from the same baseline.
//!
//! The storage format is up to the game: the config is plain serde data.

use serde::{Deserialize, Serialize};

use super::profile::ClearanceProfile;
use super::token::{ClearanceToken, ClearanceVocabulary};
use crate::error::ClearanceResult;

/// Default clearance for one holder.
///
/// ```
/// use rust_clearance::core::{ClearanceConfig, ClearanceProfile, ClearanceToken};
///
/// let config = ClearanceConfig::new()
///     .with_issued([ClearanceToken::new(1), ClearanceToken::new(2)])
///     .with_low_pop_issued([ClearanceToken::new(1)]);
///
/// assert_eq!(config.defaults_for(ClearanceProfile::LowPop), &[ClearanceToken::new(1)]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearanceConfig {
    /// Tokens issued under normal population.
    #[serde(default)]
    pub issued: Vec<ClearanceToken>,

    /// Tokens issued in low-population mode.
    #[serde(default)]
    pub low_pop_issued: Vec<ClearanceToken>,
}

impl ClearanceConfig {
    /// Create an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the normal-population defaults.
    #[must_use]
    pub fn with_issued(mut self, tokens: impl IntoIterator<Item = ClearanceToken>) -> Self {
        self.issued = tokens.into_iter().collect();
        self
    }

    /// Set the low-population defaults.
    #[must_use]
    pub fn with_low_pop_issued(mut self, tokens: impl IntoIterator<Item = ClearanceToken>) -> Self {
        self.low_pop_issued = tokens.into_iter().collect();
        self
    }

    /// Defaults for one profile.
    #[must_use]
    pub fn defaults_for(&self, profile: ClearanceProfile) -> &[ClearanceToken] {
        match profile {
            ClearanceProfile::Normal => &self.issued,
            ClearanceProfile::LowPop => &self.low_pop_issued,
        }
    }

    /// Check every default against the game's vocabulary.
    pub fn validate(&self, vocabulary: &ClearanceVocabulary) -> ClearanceResult<()> {
        vocabulary.validate(&self.issued)?;
        vocabulary.validate(&self.low_pop_issued)
    }
}
