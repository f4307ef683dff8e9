//! Object records produced by listing calls.

use serde::{Deserialize, Serialize};

/// An object stored in a container.
///
/// Records are immutable once a listing backend has produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectRecord {
    /// Full key from the container root
    pub key: String,

    /// Size of the object in bytes
    pub size: u64,
}

impl ObjectRecord {
    /// Create a new record.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// Total size in bytes of a slice of records.
pub fn total_size(records: &[ObjectRecord]) -> u64 {
    records.iter().map(|r| r.size).sum()
}
