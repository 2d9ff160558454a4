//! Issuing clearance to a target.
//!
//! An issuer carries a fixed grant (a job's access list, a printed card
//! template) and writes it onto a target when its trigger fires. Targets
//! without a holder are logged and skipped.

use serde::{Deserialize, Serialize};

use super::ClearanceHolders;
use crate::clearance::ClearanceSource;
use crate::core::{ClearanceProfile, ClearanceToken, EntityId};
use crate::error::{ClearanceError, ClearanceResult};

/// How an issuer writes its grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IssueMode {
    /// Replace the target's set with the grant.
    #[default]
    Replace,
    /// Append the granted tokens the target doesn't have yet.
    Grant,
}

/// A fixed grant written onto targets.
///
/// The low-pop grant is optional; without one the target's low-pop set is
/// left alone.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClearanceIssuer {
    /// Normal-population grant.
    pub issued: Vec<ClearanceToken>,

    /// Low-population grant.
    pub low_pop_issued: Option<Vec<ClearanceToken>>,

    /// Replace or append.
    pub mode: IssueMode,
}

impl ClearanceIssuer {
    /// Issuer that replaces the target's normal set.
    #[must_use]
    pub fn replace(tokens: impl IntoIterator<Item = ClearanceToken>) -> Self {
        Self {
            issued: tokens.into_iter().collect(),
            low_pop_issued: None,
            mode: IssueMode::Replace,
        }
    }

    /// Issuer that adds missing tokens to the target's normal set.
    #[must_use]
    pub fn grant(tokens: impl IntoIterator<Item = ClearanceToken>) -> Self {
        Self {
            issued: tokens.into_iter().collect(),
            low_pop_issued: None,
            mode: IssueMode::Grant,
        }
    }

    /// Also write a low-pop grant (builder pattern).
    #[must_use]
    pub fn with_low_pop(mut self, tokens: impl IntoIterator<Item = ClearanceToken>) -> Self {
        self.low_pop_issued = Some(tokens.into_iter().collect());
        self
    }

    /// Write the grant onto `target`.
    ///
    /// Fails with `MissingCapabilityHolder` (after logging a warning) when
    /// the target has no holder, and with `NotAuthorized` when called on an
    /// observer. Callers are expected to carry on either way.
    pub fn issue<H>(&self, holders: &mut H, target: EntityId) -> ClearanceResult<()>
    where
        H: ClearanceHolders + ?Sized,
    {
        let Some(source) = holders.clearance_of_mut(target) else {
            tracing::warn!(entity = %target, "no clearance holder to issue to, skipping");
            return Err(ClearanceError::MissingCapabilityHolder { entity: target });
        };

        self.write(source, ClearanceProfile::Normal, &self.issued)?;
        if let Some(low_pop) = &self.low_pop_issued {
            self.write(source, ClearanceProfile::LowPop, low_pop)?;
        }

        tracing::debug!(
            entity = %target,
            mode = ?self.mode,
            issued = self.issued.len(),
            low_pop = self.low_pop_issued.as_ref().map(Vec::len),
            "issued clearance"
        );
        Ok(())
    }

    fn write(
        &self,
        source: &mut ClearanceSource,
        profile: ClearanceProfile,
        tokens: &[ClearanceToken],
    ) -> ClearanceResult<()> {
        match self.mode {
            IssueMode::Replace => source.set_for(profile, tokens.iter().copied()),
            IssueMode::Grant => {
                for &token in tokens {
                    if !source.has_clearance(token, profile) {
                        source.add_for(profile, token)?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearance::ClearanceRegistry;
    use crate::core::ClearanceConfig;

    const MAINTENANCE: ClearanceToken = ClearanceToken::new(1);
    const BRIDGE: ClearanceToken = ClearanceToken::new(2);
    const ARMORY: ClearanceToken = ClearanceToken::new(3);

    const CARD: EntityId = EntityId(50);

    fn world_with_card(issued: &[ClearanceToken]) -> ClearanceRegistry {
        let mut world = ClearanceRegistry::new();
        let config = ClearanceConfig::new().with_issued(issued.iter().copied());
        world.spawn_authority(CARD, config).unwrap();
        world
    }

    #[test]
    fn test_replace() {
        let mut world = world_with_card(&[ARMORY]);

        ClearanceIssuer::replace([MAINTENANCE, BRIDGE])
            .issue(&mut world, CARD)
            .unwrap();

        assert_eq!(
            world.get(CARD).unwrap().issued_clearance().to_vec(),
            vec![MAINTENANCE, BRIDGE]
        );
    }

    #[test]
    fn test_grant_skips_present_tokens() {
        let mut world = world_with_card(&[BRIDGE]);
        world.get_mut(CARD).unwrap().take_pending();

        ClearanceIssuer::grant([BRIDGE, ARMORY]).issue(&mut world, CARD).unwrap();

        let source = world.get(CARD).unwrap();
        assert_eq!(source.issued_clearance().to_vec(), vec![BRIDGE, ARMORY]);
        assert_eq!(source.pending_deltas().len(), 1);
    }

    #[test]
    fn test_low_pop_grant() {
        let mut world = world_with_card(&[]);

        ClearanceIssuer::replace([MAINTENANCE])
            .with_low_pop([MAINTENANCE, ARMORY])
            .issue(&mut world, CARD)
            .unwrap();

        let source = world.get(CARD).unwrap();
        assert_eq!(source.low_pop_issued_clearance().to_vec(), vec![MAINTENANCE, ARMORY]);
    }

    #[test]
    fn test_without_low_pop_leaves_it_alone() {
        let mut world = ClearanceRegistry::new();
        let config = ClearanceConfig::new().with_low_pop_issued([BRIDGE]);
        world.spawn_authority(CARD, config).unwrap();

        ClearanceIssuer::replace([MAINTENANCE]).issue(&mut world, CARD).unwrap();

        assert_eq!(
            world.get(CARD).unwrap().low_pop_issued_clearance().to_vec(),
            vec![BRIDGE]
        );
    }

    #[test]
    fn test_missing_holder_is_reported_not_fatal() {
        let mut world = ClearanceRegistry::new();

        let err = ClearanceIssuer::replace([BRIDGE])
            .issue(&mut world, EntityId(404))
            .unwrap_err();
        assert!(matches!(
            err,
            ClearanceError::MissingCapabilityHolder { entity } if entity == EntityId(404)
        ));
    }

    #[test]
    fn test_observer_target_rejected() {
        let mut world = ClearanceRegistry::new();
        world.insert(ClearanceSource::observer(CARD));

        assert!(matches!(
            ClearanceIssuer::replace([BRIDGE]).issue(&mut world, CARD),
            Err(ClearanceError::NotAuthorized { .. })
        ));
        assert!(world.get(CARD).unwrap().issued_clearance().is_empty());
    }
}
