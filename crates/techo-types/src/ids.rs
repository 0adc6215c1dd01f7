//! Typed cell identifiers.
//!
//! A `CellId` is an opaque string. New cells get a UUIDv7 (time-ordered) in
//! hyphenated form; ids read from a file are kept exactly as written, so a
//! notebook using `"cell-1"` style ids round-trips unchanged. The `short()`
//! form is for logs only: v7 ids minted in the same millisecond share it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell identifier. Assigned once at creation, never reused or changed.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Create a new time-ordered ID (UUIDv7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    /// First 8 characters, for logs.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if a query string matches this ID by prefix.
    ///
    /// Case and hyphens are ignored on both sides, so a pasted
    /// `0192F3A1-7c` or a bare hex `0192f3a17c` still works.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = normalize(prefix);
        !prefix.is_empty() && normalize(&self.0).starts_with(&prefix)
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

impl Default for CellId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for CellId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CellId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.0)
    }
}

// ── Prefix resolution ───────────────────────────────────────────────────────

/// Error from prefix resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefixError {
    #[error("no cell matches '{0}'")]
    NoMatch(String),
    #[error("ambiguous cell '{prefix}': matches {candidates:?}")]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },
}

/// Resolve a query against a set of cell ids.
///
/// Resolution order:
/// 1. Exact id
/// 2. Unique prefix (ignoring case and hyphens)
/// 3. Error (no match or ambiguous)
pub fn resolve_prefix(
    ids: impl IntoIterator<Item = CellId>,
    query: &str,
) -> Result<CellId, PrefixError> {
    let ids: Vec<CellId> = ids.into_iter().collect();

    if let Some(exact) = ids.iter().find(|id| id.as_str() == query) {
        return Ok(exact.clone());
    }

    let mut matches: Vec<CellId> = ids
        .into_iter()
        .filter(|id| id.matches_prefix(query))
        .collect();

    match matches.len() {
        0 => Err(PrefixError::NoMatch(query.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(PrefixError::Ambiguous {
            prefix: query.to_string(),
            candidates: matches.iter().map(|id| id.to_string()).collect(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
