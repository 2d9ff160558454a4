//! Per-entity clearance holder.
//!
//! A `ClearanceSource` owns one entity's two clearance sets: `issued` for
//! normal population and `low_pop_issued` for low-population mode. The
//! authority instance is the only one allowed to mutate them; every
//! mutation is applied synchronously, fires the set's listeners, and queues
//! a sequenced `ClearanceDelta` for the replication bridge to flush.
//!
//! Observer instances hold a mirror copy. They are rebuilt from snapshots
//! and deltas (see `replication`) and reject local writes.
//!
//! ## Lifecycle
//!
//! - created with the owning entity, as `authority` or `observer`
//! - `initialize(config)` re-baselines the authority from its designer
//!   defaults (clear-then-append on both sets)
//! - `shutdown()` drops listeners and unflushed deltas; the source is
//!   inert until initialized again
//!
//! ## Usage
//!
//! ```
//! use rust_clearance::clearance::ClearanceSource;
//! use rust_clearance::core::{ClearanceConfig, ClearanceProfile, ClearanceToken, EntityId};
//!
//! const MAINTENANCE: ClearanceToken = ClearanceToken::new(1);
//! const BRIDGE: ClearanceToken = ClearanceToken::new(2);
//!
//! let mut card = ClearanceSource::authority(EntityId::new(7));
//! card.initialize(ClearanceConfig::new().with_issued([MAINTENANCE])).unwrap();
//! card.add_clearance(BRIDGE).unwrap();
//!
//! assert!(card.has_clearance(BRIDGE, ClearanceProfile::Normal));
//! assert!(card.current_clearance(ClearanceProfile::LowPop).is_empty());
//! assert!(card.is_dirty());
//! ```

use serde::{Deserialize, Serialize};

use super::set::{ClearanceSet, SetChange, SubscriptionId};
use crate::core::{ClearanceConfig, ClearanceProfile, ClearanceToken, EntityId};
use crate::error::{ClearanceError, ClearanceResult};
use crate::replication::{ClearanceDelta, ClearanceSnapshot};

/// Whether this instance owns the entity's clearance or mirrors it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The single writer for this entity.
    Authority,
    /// A read-only mirror fed by replication.
    Observer,
}

/// An entity's capability profile.
pub struct ClearanceSource {
    entity: EntityId,
    role: Role,
    shut_down: bool,

    issued: ClearanceSet,
    low_pop_issued: ClearanceSet,

    /// Designer defaults from the last `initialize`.
    config: ClearanceConfig,

    /// Authority: sequence of the last produced delta.
    /// Observer: sequence of the last applied delta or snapshot.
    sequence: u64,

    /// Deltas produced since the last flush.
    pending: Vec<ClearanceDelta>,

    /// Observer only: a delta went missing and a snapshot is required.
    needs_resync: bool,
}

impl ClearanceSource {
    /// Create a source with the given role.
    #[must_use]
    pub fn new(entity: EntityId, role: Role) -> Self {
        Self {
            entity,
            role,
            shut_down: false,
            issued: ClearanceSet::new(),
            low_pop_issued: ClearanceSet::new(),
            config: ClearanceConfig::default(),
            sequence: 0,
            pending: Vec::new(),
            needs_resync: false,
        }
    }

    /// Create the authoritative source for an entity.
    #[must_use]
    pub fn authority(entity: EntityId) -> Self {
        Self::new(entity, Role::Authority)
    }

    /// Create an observer mirror for an entity.
    #[must_use]
    pub fn observer(entity: EntityId) -> Self {
        Self::new(entity, Role::Observer)
    }

    // === Lifecycle ===

    /// Bring the source up from its designer configuration.
    ///
    /// On the authority both live sets are replaced with the configured
    /// defaults, whatever they held before. Observers only record the
    /// config; their contents come from replication.
    pub fn initialize(&mut self, config: ClearanceConfig) -> ClearanceResult<()> {
        self.shut_down = false;
        self.config = config;

        if self.role == Role::Authority {
            let issued = self.config.issued.clone();
            let low_pop = self.config.low_pop_issued.clone();
            self.set_for(ClearanceProfile::Normal, issued)?;
            self.set_for(ClearanceProfile::LowPop, low_pop)?;
        }

        tracing::debug!(
            entity = %self.entity,
            role = ?self.role,
            issued = self.issued.len(),
            low_pop_issued = self.low_pop_issued.len(),
            "clearance source initialized"
        );
        Ok(())
    }

    /// Detach listeners and drop unflushed deltas.
    ///
    /// Writes are rejected until the next `initialize`.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        self.issued.clear_listeners();
        self.low_pop_issued.clear_listeners();
        let dropped = self.pending.len();
        self.pending.clear();

        tracing::debug!(entity = %self.entity, dropped, "clearance source shut down");
    }

    // === Identity ===

    /// Entity this source belongs to.
    #[must_use]
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Role of this instance.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Check if this instance may mutate its sets right now.
    #[must_use]
    pub fn is_authority(&self) -> bool {
        self.role == Role::Authority && !self.shut_down
    }

    /// Check if `shutdown` was called since the last `initialize`.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Designer defaults from the last `initialize`.
    #[must_use]
    pub fn config(&self) -> &ClearanceConfig {
        &self.config
    }

    // === Queries ===

    /// Normal-population clearance.
    #[must_use]
    pub fn issued_clearance(&self) -> &ClearanceSet {
        &self.issued
    }

    /// Low-population clearance.
    #[must_use]
    pub fn low_pop_issued_clearance(&self) -> &ClearanceSet {
        &self.low_pop_issued
    }

    /// Clearance for whichever profile is active game-wide.
    #[must_use]
    pub fn current_clearance(&self, profile: ClearanceProfile) -> &ClearanceSet {
        match profile {
            ClearanceProfile::Normal => &self.issued,
            ClearanceProfile::LowPop => &self.low_pop_issued,
        }
    }

    /// Check a token against the active profile.
    #[must_use]
    pub fn has_clearance(&self, token: ClearanceToken, profile: ClearanceProfile) -> bool {
        self.current_clearance(profile).contains(token)
    }

    // === Authority mutation, by profile ===

    /// Append a token to a profile's set.
    pub fn add_for(&mut self, profile: ClearanceProfile, token: ClearanceToken) -> ClearanceResult<()> {
        self.authorize("add")?;
        let change = self.set_mut(profile).add(token);
        self.record(profile, change);
        Ok(())
    }

    /// Insert a token at `index` in a profile's set.
    pub fn insert_for(
        &mut self,
        profile: ClearanceProfile,
        index: usize,
        token: ClearanceToken,
    ) -> ClearanceResult<()> {
        self.authorize("insert")?;
        let change = self.set_mut(profile).insert(index, token)?;
        self.record(profile, change);
        Ok(())
    }

    /// Remove the first occurrence of a token.
    ///
    /// Returns `Ok(false)` if the token was not there.
    pub fn remove_for(
        &mut self,
        profile: ClearanceProfile,
        token: ClearanceToken,
    ) -> ClearanceResult<bool> {
        self.authorize("remove")?;
        match self.set_mut(profile).remove(token) {
            Some(change) => {
                self.record(profile, change);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the token at `index`, returning it.
    pub fn remove_at_for(
        &mut self,
        profile: ClearanceProfile,
        index: usize,
    ) -> ClearanceResult<ClearanceToken> {
        self.authorize("remove_at")?;
        let set = self.current_clearance(profile);
        let Some(token) = set.get(index) else {
            return Err(ClearanceError::IndexOutOfRange { index, len: set.len() });
        };
        let change = self.set_mut(profile).remove_at(index)?;
        self.record(profile, change);
        Ok(token)
    }

    /// Empty a profile's set.
    pub fn clear_for(&mut self, profile: ClearanceProfile) -> ClearanceResult<()> {
        self.authorize("clear")?;
        let change = self.set_mut(profile).clear();
        self.record(profile, change);
        Ok(())
    }

    /// Replace a profile's set: clear, then append each token in order.
    ///
    /// Every step is replicated individually.
    pub fn set_for(
        &mut self,
        profile: ClearanceProfile,
        tokens: impl IntoIterator<Item = ClearanceToken>,
    ) -> ClearanceResult<()> {
        self.authorize("set")?;
        let changes = self.set_mut(profile).replace_all(tokens);
        for change in changes {
            self.record(profile, change);
        }
        Ok(())
    }

    // === Authority mutation, named ===

    /// Append to `issued`.
    pub fn add_clearance(&mut self, token: ClearanceToken) -> ClearanceResult<()> {
        self.add_for(ClearanceProfile::Normal, token)
    }

    /// Append to `low_pop_issued`.
    pub fn add_low_pop_clearance(&mut self, token: ClearanceToken) -> ClearanceResult<()> {
        self.add_for(ClearanceProfile::LowPop, token)
    }

    /// Replace `issued`.
    pub fn set_clearance(
        &mut self,
        tokens: impl IntoIterator<Item = ClearanceToken>,
    ) -> ClearanceResult<()> {
        self.set_for(ClearanceProfile::Normal, tokens)
    }

    /// Replace `low_pop_issued`.
    pub fn set_low_pop_clearance(
        &mut self,
        tokens: impl IntoIterator<Item = ClearanceToken>,
    ) -> ClearanceResult<()> {
        self.set_for(ClearanceProfile::LowPop, tokens)
    }

    /// Remove the first occurrence from `issued`.
    pub fn remove_clearance(&mut self, token: ClearanceToken) -> ClearanceResult<bool> {
        self.remove_for(ClearanceProfile::Normal, token)
    }

    /// Remove the first occurrence from `low_pop_issued`.
    pub fn remove_low_pop_clearance(&mut self, token: ClearanceToken) -> ClearanceResult<bool> {
        self.remove_for(ClearanceProfile::LowPop, token)
    }

    /// Empty `issued`.
    pub fn clear_clearance(&mut self) -> ClearanceResult<()> {
        self.clear_for(ClearanceProfile::Normal)
    }

    /// Empty `low_pop_issued`.
    pub fn clear_low_pop_clearance(&mut self) -> ClearanceResult<()> {
        self.clear_for(ClearanceProfile::LowPop)
    }

    // === Listeners ===

    /// Subscribe to changes of one profile's set.
    ///
    /// Fires on the authority for local writes and on observers for
    /// replicated ones.
    pub fn subscribe<F>(&mut self, profile: ClearanceProfile, listener: F) -> SubscriptionId
    where
        F: FnMut(&SetChange) + Send + 'static,
    {
        self.set_mut(profile).subscribe(listener)
    }

    /// Remove a listener from one profile's set.
    pub fn unsubscribe(&mut self, profile: ClearanceProfile, id: SubscriptionId) -> bool {
        self.set_mut(profile).unsubscribe(id)
    }

    // === Replication state ===

    /// Check if there are unflushed deltas.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Unflushed deltas, oldest first.
    #[must_use]
    pub fn pending_deltas(&self) -> &[ClearanceDelta] {
        &self.pending
    }

    /// Drain unflushed deltas, clearing the dirty mark.
    pub fn take_pending(&mut self) -> Vec<ClearanceDelta> {
        std::mem::take(&mut self.pending)
    }

    /// Last produced (authority) or applied (observer) sequence number.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Check if an observer has missed a delta and needs a snapshot.
    #[must_use]
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    /// Full current state of both sets. O(1) in the set sizes.
    #[must_use]
    pub fn snapshot(&self) -> ClearanceSnapshot {
        ClearanceSnapshot {
            entity: self.entity,
            sequence: self.sequence,
            issued: self.issued.tokens().clone(),
            low_pop_issued: self.low_pop_issued.tokens().clone(),
        }
    }

    // === Internals shared with the replication mirror ===

    pub(crate) fn set_mut(&mut self, profile: ClearanceProfile) -> &mut ClearanceSet {
        match profile {
            ClearanceProfile::Normal => &mut self.issued,
            ClearanceProfile::LowPop => &mut self.low_pop_issued,
        }
    }

    pub(crate) fn mark_synced(&mut self, sequence: u64) {
        self.sequence = sequence;
        self.needs_resync = false;
    }

    pub(crate) fn flag_resync(&mut self) {
        self.needs_resync = true;
    }

    fn authorize(&self, operation: &'static str) -> ClearanceResult<()> {
        if self.is_authority() {
            return Ok(());
        }
        tracing::warn!(
            entity = %self.entity,
            role = ?self.role,
            shut_down = self.shut_down,
            operation,
            "rejected clearance write on non-authority"
        );
        Err(ClearanceError::NotAuthorized { entity: self.entity })
    }

    fn record(&mut self, profile: ClearanceProfile, change: SetChange) {
        self.sequence += 1;
        let delta = ClearanceDelta {
            entity: self.entity,
            sequence: self.sequence,
            profile,
            change,
        };
        tracing::trace!(
            entity = %self.entity,
            sequence = self.sequence,
            %profile,
            op = ?change.op(),
            index = change.index(),
            "queued clearance delta"
        );
        self.pending.push(delta);
    }
}

impl std::fmt::Debug for ClearanceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearanceSource")
            .field("entity", &self.entity)
            .field("role", &self.role)
            .field("shut_down", &self.shut_down)
            .field("issued", &self.issued)
            .field("low_pop_issued", &self.low_pop_issued)
            .field("sequence", &self.sequence)
            .field("pending", &self.pending.len())
            .finish()
    }
}
