//! Clearance holders and their token sets.
//!
//! ## Key Types
//!
//! - [`ClearanceSet`]: ordered token list with positional operations and
//!   synchronous change listeners
//! - [`ClearanceSource`]: an entity's authoritative (or mirrored) pair of
//!   sets, normal and low-pop
//! - [`ClearanceRegistry`]: entity to holder lookup for one process
//!
//! ## Authority
//!
//! Exactly one instance per entity is the authority. Mutations go through
//! `&mut ClearanceSource`, so a single owner serializes them; observers
//! reject writes with `ClearanceError::NotAuthorized` and change nothing.

mod registry;
mod set;
mod source;

pub use registry::ClearanceRegistry;
pub use set::{ClearanceListener, ClearanceSet, SetChange, SetOp, SubscriptionId};
pub use source::{ClearanceSource, Role};
