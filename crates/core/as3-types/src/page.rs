//! A single page of listing results.

use serde::{Deserialize, Serialize};

use crate::ObjectRecord;

/// One page returned by a listing backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Objects directly under the listed prefix (all objects when no delimiter was given)
    pub items: Vec<ObjectRecord>,

    /// Child group-prefixes, only populated for delimited listings
    pub group_prefixes: Vec<String>,

    /// Token for the next page, `None` on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl ListPage {
    /// Whether more pages follow this one.
    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }
}
