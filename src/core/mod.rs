//! Core clearance types: entities, tokens, profiles, configuration.
//!
//! These are the game-agnostic building blocks. Games declare their token
//! vocabulary and per-holder defaults via `ClearanceVocabulary` and
//! `ClearanceConfig` rather than modifying the core.

pub mod entity;
pub mod token;
pub mod profile;
pub mod config;

pub use entity::EntityId;
pub use token::{ClearanceToken, ClearanceVocabulary};
pub use profile::{ClearanceProfile, PopulationPolicy};
pub use config::ClearanceConfig;
