//! Shared primitive types used across both store representations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a record in its store's backing collection.
/// Stable for the lifetime of a load; sorts never move records.
pub type Slot = usize;

/// Which physical representation a store uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Indexed,
    Linked,
}

impl StoreKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Indexed => "Array",
            Self::Linked  => "Linked List",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of a location sort. Descending is always produced by
/// reversing an ascending pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn is_ascending(&self) -> bool {
        matches!(self, Self::Ascending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ascending  => "A-Z",
            Self::Descending => "Z-A",
        }
    }
}
