//! Ordered clearance token sets with change notification.
//!
//! A `ClearanceSet` is an ordered, duplicate-permitting list of tokens.
//! Order is meaningful for replication (operations are positional) but not
//! for access checks (membership only). Consumers must not assume set
//! semantics: the same token may appear twice.
//!
//! Every mutation produces a `SetChange` describing it precisely enough for
//! a remote mirror to replay the identical operation, and fires the set's
//! listeners synchronously once the change is applied locally.
//!
//! Storage is an `im::Vector`, so taking a snapshot is O(1).

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::core::ClearanceToken;
use crate::error::{ClearanceError, ClearanceResult};

/// Kind of set operation, with its replication wire code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOp {
    /// Append at the end.
    Add,
    /// Insert at an index, shifting later entries.
    Insert,
    /// Remove the entry at an index.
    RemoveAt,
    /// Remove everything.
    Clear,
    /// Replace the value at an index.
    ///
    /// Accepted from the wire for forward compatibility but never produced:
    /// holders replace their contents with clear-then-append.
    Set,
}

impl SetOp {
    /// Wire code for this operation.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            SetOp::Add => 0,
            SetOp::Insert => 1,
            SetOp::RemoveAt => 2,
            SetOp::Clear => 3,
            SetOp::Set => 4,
        }
    }

    /// Decode a wire code.
    pub fn from_code(code: u8) -> ClearanceResult<Self> {
        match code {
            0 => Ok(SetOp::Add),
            1 => Ok(SetOp::Insert),
            2 => Ok(SetOp::RemoveAt),
            3 => Ok(SetOp::Clear),
            4 => Ok(SetOp::Set),
            _ => Err(ClearanceError::UnknownReplicationOperation { code }),
        }
    }
}

/// A single applied mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetChange {
    /// `token` was appended and now sits at `index` (the last slot).
    Add { index: usize, token: ClearanceToken },
    /// `token` was inserted at `index`.
    Insert { index: usize, token: ClearanceToken },
    /// `removed` was taken out of `index`.
    RemoveAt { index: usize, removed: ClearanceToken },
    /// The set was emptied.
    Clear,
    /// The value at `index` was replaced.
    Set {
        index: usize,
        old: ClearanceToken,
        new: ClearanceToken,
    },
}

impl SetChange {
    /// Operation kind.
    #[must_use]
    pub const fn op(&self) -> SetOp {
        match self {
            SetChange::Add { .. } => SetOp::Add,
            SetChange::Insert { .. } => SetOp::Insert,
            SetChange::RemoveAt { .. } => SetOp::RemoveAt,
            SetChange::Clear => SetOp::Clear,
            SetChange::Set { .. } => SetOp::Set,
        }
    }

    /// Position the operation applied to (0 for `Clear`).
    #[must_use]
    pub const fn index(&self) -> usize {
        match *self {
            SetChange::Add { index, .. }
            | SetChange::Insert { index, .. }
            | SetChange::RemoveAt { index, .. }
            | SetChange::Set { index, .. } => index,
            SetChange::Clear => 0,
        }
    }

    /// Value that was there before, if the operation replaced or removed one.
    #[must_use]
    pub const fn old_token(&self) -> Option<ClearanceToken> {
        match *self {
            SetChange::RemoveAt { removed, .. } => Some(removed),
            SetChange::Set { old, .. } => Some(old),
            _ => None,
        }
    }

    /// Value that is there now, if the operation wrote one.
    #[must_use]
    pub const fn new_token(&self) -> Option<ClearanceToken> {
        match *self {
            SetChange::Add { token, .. } | SetChange::Insert { token, .. } => Some(token),
            SetChange::Set { new, .. } => Some(new),
            _ => None,
        }
    }
}

/// Handle returned by `ClearanceSet::subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u32);

/// Callback fired after every applied change.
pub type ClearanceListener = Box<dyn FnMut(&SetChange) + Send>;

/// Ordered sequence of clearance tokens.
///
/// ## Usage
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use rust_clearance::clearance::{ClearanceSet, SetChange};
/// use rust_clearance::core::ClearanceToken;
///
/// let mut set = ClearanceSet::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// set.subscribe(move |change| sink.lock().unwrap().push(*change));
///
/// set.add(ClearanceToken::new(3));
/// assert!(set.contains(ClearanceToken::new(3)));
/// assert_eq!(
///     seen.lock().unwrap()[0],
///     SetChange::Add { index: 0, token: ClearanceToken::new(3) }
/// );
/// ```
#[derive(Default)]
pub struct ClearanceSet {
    tokens: Vector<ClearanceToken>,
    listeners: Vec<(SubscriptionId, ClearanceListener)>,
    next_subscription: u32,
}

impl ClearanceSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Mutation ===

    /// Append a token.
    pub fn add(&mut self, token: ClearanceToken) -> SetChange {
        self.tokens.push_back(token);
        let change = SetChange::Add {
            index: self.tokens.len() - 1,
            token,
        };
        self.notify(&change);
        change
    }

    /// Insert a token at `index`, shifting later entries.
    ///
    /// `index == len` appends. Anything larger is rejected before the set
    /// is touched.
    pub fn insert(&mut self, index: usize, token: ClearanceToken) -> ClearanceResult<SetChange> {
        if index > self.tokens.len() {
            return Err(ClearanceError::IndexOutOfRange {
                index,
                len: self.tokens.len(),
            });
        }
        self.tokens.insert(index, token);
        let change = SetChange::Insert { index, token };
        self.notify(&change);
        Ok(change)
    }

    /// Remove the token at `index`.
    pub fn remove_at(&mut self, index: usize) -> ClearanceResult<SetChange> {
        if index >= self.tokens.len() {
            return Err(ClearanceError::IndexOutOfRange {
                index,
                len: self.tokens.len(),
            });
        }
        let removed = self.tokens.remove(index);
        let change = SetChange::RemoveAt { index, removed };
        self.notify(&change);
        Ok(change)
    }

    /// Remove the first occurrence of `token`.
    ///
    /// Returns `None` without notifying anyone if the token is absent.
    pub fn remove(&mut self, token: ClearanceToken) -> Option<SetChange> {
        let index = self.position(token)?;
        self.remove_at(index).ok()
    }

    /// Remove every token.
    pub fn clear(&mut self) -> SetChange {
        self.tokens.clear();
        let change = SetChange::Clear;
        self.notify(&change);
        change
    }

    /// Replace the contents with `tokens` by clearing then appending.
    ///
    /// Listeners see one `Clear` followed by one `Add` per token.
    pub fn replace_all(
        &mut self,
        tokens: impl IntoIterator<Item = ClearanceToken>,
    ) -> Vec<SetChange> {
        let mut changes = vec![self.clear()];
        changes.extend(tokens.into_iter().map(|token| self.add(token)));
        changes
    }

    /// Replay a change produced by another set.
    ///
    /// `Set` is accepted and ignored. An `Add` whose index is not the
    /// current length means the sets have diverged and is rejected.
    pub fn apply(&mut self, change: &SetChange) -> ClearanceResult<()> {
        match *change {
            SetChange::Add { index, token } => {
                if index != self.tokens.len() {
                    return Err(ClearanceError::IndexOutOfRange {
                        index,
                        len: self.tokens.len(),
                    });
                }
                self.add(token);
            }
            SetChange::Insert { index, token } => {
                self.insert(index, token)?;
            }
            SetChange::RemoveAt { index, .. } => {
                self.remove_at(index)?;
            }
            SetChange::Clear => {
                self.clear();
            }
            SetChange::Set { .. } => {}
        }
        Ok(())
    }

    // === Queries ===

    /// Membership test.
    #[must_use]
    pub fn contains(&self, token: ClearanceToken) -> bool {
        self.tokens.iter().any(|&t| t == token)
    }

    /// Index of the first occurrence of `token`.
    #[must_use]
    pub fn position(&self, token: ClearanceToken) -> Option<usize> {
        self.tokens.iter().position(|&t| t == token)
    }

    /// Token at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<ClearanceToken> {
        self.tokens.get(index).copied()
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate tokens in order.
    pub fn iter(&self) -> impl Iterator<Item = ClearanceToken> + '_ {
        self.tokens.iter().copied()
    }

    /// Persistent view of the contents. Cloning it is O(1).
    #[must_use]
    pub fn tokens(&self) -> &Vector<ClearanceToken> {
        &self.tokens
    }

    /// Copy the contents into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ClearanceToken> {
        self.tokens.iter().copied().collect()
    }

    // === Listeners ===

    /// Register a listener fired after every change.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&SetChange) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Drop every listener.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&mut self, change: &SetChange) {
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}

impl std::fmt::Debug for ClearanceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearanceSet")
            .field("tokens", &self.tokens)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl FromIterator<ClearanceToken> for ClearanceSet {
    fn from_iter<I: IntoIterator<Item = ClearanceToken>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const MAINTENANCE: ClearanceToken = ClearanceToken::new(1);
    const BRIDGE: ClearanceToken = ClearanceToken::new(2);
    const ARMORY: ClearanceToken = ClearanceToken::new(3);

    fn recorded(set: &mut ClearanceSet) -> Arc<Mutex<Vec<SetChange>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        set.subscribe(move |change| sink.lock().unwrap().push(*change));
        log
    }

    #[test]
    fn test_add_and_contains() {
        let mut set = ClearanceSet::new();
        let change = set.add(MAINTENANCE);

        assert_eq!(change, SetChange::Add { index: 0, token: MAINTENANCE });
        assert!(set.contains(MAINTENANCE));
        assert!(!set.contains(BRIDGE));
        assert_eq!(set.add(BRIDGE).index(), 1);
    }

    #[test]
    fn test_insert_positions() {
        let mut set: ClearanceSet = [MAINTENANCE, ARMORY].into_iter().collect();

        set.insert(1, BRIDGE).unwrap();
        assert_eq!(set.to_vec(), vec![MAINTENANCE, BRIDGE, ARMORY]);

        // len is a valid insertion point
        set.insert(3, MAINTENANCE).unwrap();
        assert_eq!(set.get(3), Some(MAINTENANCE));
    }

    #[test]
    fn test_insert_out_of_range_leaves_set_untouched() {
        let mut set: ClearanceSet = [MAINTENANCE].into_iter().collect();
        let log = recorded(&mut set);

        let err = set.insert(2, BRIDGE).unwrap_err();
        assert!(matches!(err, ClearanceError::IndexOutOfRange { index: 2, len: 1 }));
        assert_eq!(set.to_vec(), vec![MAINTENANCE]);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_at_reports_removed_token() {
        let mut set: ClearanceSet = [MAINTENANCE, BRIDGE].into_iter().collect();

        let change = set.remove_at(0).unwrap();
        assert_eq!(change, SetChange::RemoveAt { index: 0, removed: MAINTENANCE });
        assert_eq!(change.old_token(), Some(MAINTENANCE));
        assert_eq!(change.new_token(), None);
        assert_eq!(set.to_vec(), vec![BRIDGE]);

        assert!(matches!(
            set.remove_at(1),
            Err(ClearanceError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_remove_first_occurrence_only() {
        let mut set: ClearanceSet = [BRIDGE, MAINTENANCE, BRIDGE].into_iter().collect();

        let change = set.remove(BRIDGE).unwrap();
        assert_eq!(change.index(), 0);
        assert_eq!(set.to_vec(), vec![MAINTENANCE, BRIDGE]);
        assert!(set.contains(BRIDGE));
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let mut set: ClearanceSet = [MAINTENANCE].into_iter().collect();
        let log = recorded(&mut set);

        assert_eq!(set.remove(ARMORY), None);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_notifies_even_when_empty() {
        let mut set = ClearanceSet::new();
        let log = recorded(&mut set);

        set.clear();
        assert_eq!(*log.lock().unwrap(), vec![SetChange::Clear]);
    }

    #[test]
    fn test_replace_all_is_clear_then_append() {
        let mut set: ClearanceSet = [ARMORY].into_iter().collect();
        let log = recorded(&mut set);

        set.replace_all([MAINTENANCE, BRIDGE]);

        assert_eq!(set.to_vec(), vec![MAINTENANCE, BRIDGE]);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                SetChange::Clear,
                SetChange::Add { index: 0, token: MAINTENANCE },
                SetChange::Add { index: 1, token: BRIDGE },
            ]
        );
    }

    #[test]
    fn test_apply_replays_changes() {
        let mut authority = ClearanceSet::new();
        let mut mirror = ClearanceSet::new();

        let changes = vec![
            authority.add(MAINTENANCE),
            authority.add(BRIDGE),
            authority.insert(1, ARMORY).unwrap(),
            authority.remove_at(0).unwrap(),
        ];
        for change in &changes {
            mirror.apply(change).unwrap();
        }

        assert_eq!(mirror.to_vec(), authority.to_vec());
        assert_eq!(mirror.to_vec(), vec![ARMORY, BRIDGE]);
    }

    #[test]
    fn test_apply_add_at_wrong_index_is_rejected() {
        let mut mirror: ClearanceSet = [MAINTENANCE].into_iter().collect();
        let log = recorded(&mut mirror);

        let err = mirror
            .apply(&SetChange::Add { index: 3, token: BRIDGE })
            .unwrap_err();
        assert!(matches!(err, ClearanceError::IndexOutOfRange { index: 3, len: 1 }));
        assert_eq!(mirror.to_vec(), vec![MAINTENANCE]);
        assert!(log.lock().unwrap().is_empty());

        mirror.apply(&SetChange::Add { index: 1, token: BRIDGE }).unwrap();
        assert_eq!(mirror.to_vec(), vec![MAINTENANCE, BRIDGE]);
    }

    #[test]
    fn test_apply_set_is_noop() {
        let mut set: ClearanceSet = [MAINTENANCE].into_iter().collect();
        let log = recorded(&mut set);

        set.apply(&SetChange::Set { index: 0, old: MAINTENANCE, new: BRIDGE })
            .unwrap();

        assert_eq!(set.to_vec(), vec![MAINTENANCE]);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut set = ClearanceSet::new();
        let log = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&log);
        let id = set.subscribe(move |_| *sink.lock().unwrap() += 1);

        set.add(MAINTENANCE);
        assert!(set.unsubscribe(id));
        assert!(!set.unsubscribe(id));
        set.add(BRIDGE);

        assert_eq!(*log.lock().unwrap(), 1);
        assert_eq!(set.listener_count(), 0);
    }

    #[test]
    fn test_op_codes() {
        for op in [SetOp::Add, SetOp::Insert, SetOp::RemoveAt, SetOp::Clear, SetOp::Set] {
            assert_eq!(SetOp::from_code(op.code()).unwrap(), op);
        }
        assert!(matches!(
            SetOp::from_code(9),
            Err(ClearanceError::UnknownReplicationOperation { code: 9 })
        ));
    }

    #[test]
    fn test_duplicates_permitted() {
        let mut set = ClearanceSet::new();
        set.add(BRIDGE);
        set.add(BRIDGE);
        assert_eq!(set.len(), 2);
    }
}
