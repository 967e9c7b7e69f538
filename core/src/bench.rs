//! Benchmark suite: the same operation sequence against any store.
//!
//! SUITE ORDER (fixed, so two reports line up row for row):
//!   1. load
//!   2. linear scan, per channel
//!   3. bucket lookup, per channel
//!   4. binary search: channel, type, location
//!   5. quicksort A-Z, Z-A
//!   6. mergesort A-Z, Z-A
//!
//! Load order is restored before every step after the load, so each
//! operation starts from the same state on every representation.

use crate::{
    channel::PaymentChannel,
    error::StoreResult,
    instrument::{measure, OpMetrics},
    record::Field,
    store::{indexed::IndexedStore, linked::LinkedStore, LoadSummary, TableStore},
    types::{SortOrder, StoreKind},
};
use serde::Serialize;

/// Keys the binary-search steps look for.
#[derive(Debug, Clone)]
pub struct BenchKeys {
    pub transaction_type: String,
    pub location:         String,
}

impl Default for BenchKeys {
    fn default() -> Self {
        Self {
            transaction_type: "deposit".into(),
            location:         "Tokyo".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub store:  StoreKind,
    pub loaded: LoadSummary,
    pub ops:    Vec<OpMetrics>,
}

impl BenchReport {
    /// True when both reports ran the same steps and every query returned
    /// the same number of rows.
    pub fn agrees_with(&self, other: &BenchReport) -> bool {
        self.loaded == other.loaded
            && self.ops.len() == other.ops.len()
            && self
                .ops
                .iter()
                .zip(&other.ops)
                .all(|(a, b)| a.operation == b.operation && a.result_len == b.result_len)
    }
}

/// Run the full suite against `store`, loading it from `lines`.
pub fn run_suite(
    store: &mut dyn TableStore,
    lines: &[&str],
    channel_filter: Option<&str>,
    keys: &BenchKeys,
) -> StoreResult<BenchReport> {
    let mut ops = Vec::new();

    let (loaded, m) = measure(store, "load", |s| {
        s.load(&mut lines.iter().copied(), channel_filter)
    });
    let loaded = loaded?;
    ops.push(m.with_result_len(loaded.retained));

    for channel in PaymentChannel::ALL {
        store.restore_load_order();
        let (hits, m) = measure(store, &format!("scan Channel={channel}"), |s| {
            s.scan_by(Field::PaymentChannel, channel.as_str())
        });
        ops.push(m.with_result_len(hits.len()));
    }

    for channel in PaymentChannel::ALL {
        let (hits, m) = measure(store, &format!("bucket Channel={channel}"), |s| {
            s.by_channel(channel.choice())
        });
        ops.push(m.with_result_len(hits?.len()));
    }

    let searches = [
        (Field::PaymentChannel, PaymentChannel::Card.as_str()),
        (Field::TransactionType, keys.transaction_type.as_str()),
        (Field::Location, keys.location.as_str()),
    ];
    for (field, key) in searches {
        store.restore_load_order();
        let (hits, m) = measure(store, &format!("binary {}={key}", field.label()), |s| {
            s.binary_search_by(field, key)
        });
        ops.push(m.with_result_len(hits.len()));
    }

    for order in [SortOrder::Ascending, SortOrder::Descending] {
        store.restore_load_order();
        let ((), m) = measure(store, &format!("quicksort {}", order.label()), |s| {
            s.sort_by_location(order)
        });
        ops.push(m);
    }

    for order in [SortOrder::Ascending, SortOrder::Descending] {
        store.restore_load_order();
        let ((), m) = measure(store, &format!("mergesort {}", order.label()), |s| {
            s.sort_by_location_merge(order)
        });
        ops.push(m);
    }

    store.restore_load_order();
    log::info!("[{}] suite finished: {} steps", store.kind(), ops.len());
    Ok(BenchReport { store: store.kind(), loaded, ops })
}

/// Run the suite on a fresh store of each kind.
pub fn compare(
    lines: &[&str],
    max_records: usize,
    channel_filter: Option<&str>,
    keys: &BenchKeys,
) -> StoreResult<(BenchReport, BenchReport)> {
    let mut indexed = IndexedStore::with_max_records(max_records);
    let mut linked = LinkedStore::with_max_records(max_records);
    let a = run_suite(&mut indexed, lines, channel_filter, keys)?;
    let b = run_suite(&mut linked, lines, channel_filter, keys)?;
    if !a.agrees_with(&b) {
        log::warn!("indexed and linked reports disagree on result sizes");
    }
    Ok((a, b))
}
