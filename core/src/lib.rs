//! txstore-core: a transaction table held two ways.
//!
//! The same records are loaded into an [`IndexedStore`] (contiguous records
//! plus a permutation array) and a [`LinkedStore`] (arena-backed singly-linked
//! chain). Both implement [`TableStore`], so sorts and searches can be timed
//! against each other on identical data.
//!
//! Boundary modules:
//!   - `parser`:     CSV line -> Record
//!   - `export`:     ResultSet -> JSON document
//!   - `instrument`: elapsed time and memory around an operation
//!   - `sample`:     deterministic synthetic rows for benchmarks and tests

pub mod bench;
pub mod channel;
pub mod config;
pub mod error;
pub mod export;
pub mod instrument;
pub mod parser;
pub mod record;
pub mod result_set;
pub mod sample;
pub mod store;
pub mod types;

pub use channel::{ChannelCounts, ChannelPartition, PaymentChannel};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use record::{Field, Record};
pub use result_set::{Page, ResultSet};
pub use store::{indexed::IndexedStore, linked::LinkedStore, LoadSummary, TableStore};
pub use types::{SortOrder, StoreKind};
