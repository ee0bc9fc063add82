//! Transformer error types.

use std::fmt;

/// Kind of named entity checked for identifier collisions
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntityKind {
    /// Zone entry
    Zone,
    /// Link entry
    Link,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Zone => f.write_str("Zone"),
            Self::Link => f.write_str("Link"),
        }
    }
}

/// Fatal transformer error
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// Two identifiers have the same djb2 hash
    #[error("Hash collision: {kind} {name} with existing {existing}")]
    HashCollision {
        /// Kind of the colliding entry
        kind: EntityKind,
        /// Name of the colliding entry
        name: String,
        /// Name already holding the hash
        existing: String,
    },
}
