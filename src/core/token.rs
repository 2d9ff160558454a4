//! Clearance tokens and the vocabulary that names them.
//!
//! A `ClearanceToken` is the atomic unit of access: "maintenance",
//! "bridge", "armory" and so on. The engine never hardcodes which tokens
//! exist. Games define a closed vocabulary at startup with
//! `ClearanceVocabulary` and refer to tokens by id from then on.
//!
//! ## Usage
//!
//! ```
//! use rust_clearance::core::{ClearanceToken, ClearanceVocabulary};
//!
//! const MAINTENANCE: ClearanceToken = ClearanceToken::new(1);
//! const BRIDGE: ClearanceToken = ClearanceToken::new(2);
//!
//! let vocab = ClearanceVocabulary::new()
//!     .with_token(MAINTENANCE, "maintenance")
//!     .with_token(BRIDGE, "bridge");
//!
//! assert_eq!(vocab.token("bridge"), Some(BRIDGE));
//! assert_eq!(vocab.name(MAINTENANCE), Some("maintenance"));
//! assert!(vocab.resolve(["bridge", "armory"]).is_err());
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ClearanceError, ClearanceResult};

/// Clearance token identifier. Games define what tokens exist.
///
/// The engine doesn't interpret token IDs; they're opaque identifiers
/// compared by value. Games assign meaning via `ClearanceVocabulary`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClearanceToken(pub u16);

impl ClearanceToken {
    /// Create a new clearance token.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for ClearanceToken {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ClearanceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Clearance({})", self.0)
    }
}

/// Closed, game-defined table of clearance tokens and their names.
///
/// Used to turn designer-facing names into tokens and to reject
/// configuration that mentions tokens the game never declared.
#[derive(Clone, Debug, Default)]
pub struct ClearanceVocabulary {
    by_name: FxHashMap<String, ClearanceToken>,
    names: FxHashMap<ClearanceToken, String>,
}

impl ClearanceVocabulary {
    /// Create an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a token (builder pattern).
    ///
    /// Re-declaring a token replaces its previous name.
    #[must_use]
    pub fn with_token(mut self, token: ClearanceToken, name: impl Into<String>) -> Self {
        self.declare(token, name);
        self
    }

    /// Declare a token.
    pub fn declare(&mut self, token: ClearanceToken, name: impl Into<String>) {
        let name = name.into();
        if let Some(previous) = self.names.insert(token, name.clone()) {
            self.by_name.remove(&previous);
        }
        self.by_name.insert(name, token);
    }

    /// Look up a token by name.
    #[must_use]
    pub fn token(&self, name: &str) -> Option<ClearanceToken> {
        self.by_name.get(name).copied()
    }

    /// Look up the name of a token.
    #[must_use]
    pub fn name(&self, token: ClearanceToken) -> Option<&str> {
        self.names.get(&token).map(String::as_str)
    }

    /// Check if a token was declared.
    #[must_use]
    pub fn contains(&self, token: ClearanceToken) -> bool {
        self.names.contains_key(&token)
    }

    /// Resolve a list of names into tokens, preserving order.
    ///
    /// Fails on the first name the vocabulary does not know.
    pub fn resolve<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> ClearanceResult<Vec<ClearanceToken>> {
        names
            .into_iter()
            .map(|name| {
                self.token(name).ok_or_else(|| ClearanceError::UnknownTokenName {
                    name: name.to_string(),
                })
            })
            .collect()
    }

    /// Check that every token belongs to this vocabulary.
    pub fn validate<'a>(
        &self,
        tokens: impl IntoIterator<Item = &'a ClearanceToken>,
    ) -> ClearanceResult<()> {
        for &token in tokens {
            if !self.contains(token) {
                return Err(ClearanceError::UnknownToken { token });
            }
        }
        Ok(())
    }

    /// Number of declared tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no tokens were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate declared tokens in id order.
    pub fn tokens(&self) -> impl Iterator<Item = ClearanceToken> {
        let mut tokens: Vec<_> = self.names.keys().copied().collect();
        tokens.sort_unstable();
        tokens.into_iter()
    }
}
