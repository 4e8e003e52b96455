// src/services/resolver.rs
//! Identifier resolver: lets operators type any unique substring of a mirror id.
//!
//! Policy for every command targeting an existing mirror:
//! - no candidate   -> abort with [`AdminError::NoMatch`]
//! - one candidate  -> proceed with it
//! - many           -> abort with [`AdminError::Ambiguous`] listing them all.
//!   We never guess.

use crate::error::{AdminError, Result};
use crate::services::keys;
use crate::services::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    None,
    One(String),
    Many(Vec<String>),
}

impl Resolution {
    fn from_candidates(mut candidates: Vec<String>) -> Self {
        match candidates.len() {
            0 => Resolution::None,
            1 => Resolution::One(candidates.remove(0)),
            _ => Resolution::Many(candidates),
        }
    }

    /// Apply the disambiguation policy.
    pub fn into_single(self, query: &str) -> Result<String> {
        match self {
            Resolution::None => Err(AdminError::NoMatch(query.to_string())),
            Resolution::One(id) => Ok(id),
            Resolution::Many(candidates) => Err(AdminError::Ambiguous {
                query: query.to_string(),
                candidates,
            }),
        }
    }
}

/// Every known identifier containing `query` (case-sensitive), in list order.
pub fn match_mirror(store: &Store, query: &str) -> Result<Vec<String>> {
    if query.is_empty() {
        return Err(AdminError::NothingToMatch);
    }
    Ok(store
        .lrange(keys::MIRRORS)?
        .into_iter()
        .filter(|id| id.contains(query))
        .collect())
}

pub fn resolve(store: &Store, query: &str) -> Result<Resolution> {
    Ok(Resolution::from_candidates(match_mirror(store, query)?))
}

/// Resolve `query` to exactly one identifier or fail with the policy's error.
pub fn resolve_one(store: &Store, query: &str) -> Result<String> {
    resolve(store, query)?.into_single(query)
}
