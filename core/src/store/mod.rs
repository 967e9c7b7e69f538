//! The shared query contract and the load path both stores use.
//!
//! RULE: both representations load through `ingest`, so retention,
//! truncation and partitioning are decided in exactly one place. The
//! stores differ only in how they hold and reorder what it hands them.

pub mod indexed;
pub mod linked;

use crate::{
    channel::{ChannelCounts, ChannelPartition, PaymentChannel},
    error::StoreResult,
    parser,
    record::{Field, Record},
    result_set::ResultSet,
    types::{SortOrder, StoreKind},
};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// What a load did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Records kept in the primary collection.
    pub retained:    usize,
    /// Non-empty data lines parsed, whether retained or filtered out.
    pub scanned:     usize,
    /// Distribution over every scanned record, independent of the filter.
    pub per_channel: ChannelCounts,
    /// Numeric columns that held unreadable text and were zeroed.
    pub defaulted:   usize,
    /// True when input remained after the record cap was reached.
    pub truncated:   bool,
}

/// Operations every store representation supports.
///
/// Sorts and the indexed binary search take `&mut self`; callers
/// serialize access themselves.
pub trait TableStore {
    fn kind(&self) -> StoreKind;

    /// Replace all contents with the records parsed from `lines`.
    ///
    /// A leading CSV header is skipped. With `channel_filter`, only records
    /// whose channel equals it exactly are retained, but every scanned
    /// record still lands in the channel partition and distribution.
    /// An unknown filter is rejected before any state changes.
    fn load<'a>(
        &mut self,
        lines: &mut dyn Iterator<Item = &'a str>,
        channel_filter: Option<&str>,
    ) -> StoreResult<LoadSummary>;

    fn size(&self) -> usize;

    /// Discard records, ordering state and partition buckets.
    fn reset(&mut self);

    /// Every record whose `field` equals `value`, in current storage order.
    fn scan_by(&self, field: Field, value: &str) -> ResultSet;

    /// The pre-built partition bucket for a 1-based channel choice.
    fn by_channel(&self, choice: usize) -> StoreResult<ResultSet>;

    /// Stable-sort by `field`, then locate every record equal to `key`.
    fn binary_search_by(&mut self, field: Field, key: &str) -> ResultSet;

    /// Three-way quicksort on location.
    fn sort_by_location(&mut self, order: SortOrder);

    /// Stable mergesort on location.
    fn sort_by_location_merge(&mut self, order: SortOrder);

    /// Copies of the records at positions `start..end` of the current
    /// order. Out-of-range bounds are clamped.
    fn records_in_range(&self, start: usize, end: usize) -> ResultSet;

    /// Put the records back in the order they were loaded.
    fn restore_load_order(&mut self);

    fn partition(&self) -> &ChannelPartition;

    /// Estimated bytes held by the primary collection and its ordering
    /// structure (index array or links).
    fn footprint_bytes(&self) -> usize;

    // ── Provided ─────────────────────────────────────────────────

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// First `n` records in current order.
    fn head(&self, n: usize) -> ResultSet {
        self.records_in_range(0, n)
    }

    fn channel_counts(&self) -> ChannelCounts {
        self.partition().counts()
    }

    /// Read a whole CSV file, then load it. The file is read completely
    /// before the store is touched, so an unreadable source leaves the
    /// previous contents in place.
    fn load_path(&mut self, path: &Path, channel_filter: Option<&str>) -> StoreResult<LoadSummary> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            log::error!("[{}] cannot open {}: {e}", self.kind(), path.display());
            e
        })?;
        self.load(&mut content.lines(), channel_filter)
    }
}

/// Validate an optional channel filter string.
pub(crate) fn parse_filter(filter: Option<&str>) -> StoreResult<Option<PaymentChannel>> {
    filter.map(str::parse).transpose()
}

/// Parse `lines` and hand each retained record to `retain`, in input order.
/// Returns the summary and a freshly built partition.
pub(crate) fn ingest<'a>(
    lines: &mut dyn Iterator<Item = &'a str>,
    filter: Option<PaymentChannel>,
    max_records: usize,
    mut retain: impl FnMut(Record),
) -> (LoadSummary, ChannelPartition) {
    let mut summary = LoadSummary::default();
    let mut partition = ChannelPartition::new();
    let mut first = true;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let line = if std::mem::take(&mut first) {
            let line = parser::strip_bom(line);
            if parser::is_header(line) {
                continue;
            }
            line
        } else {
            line
        };
        if summary.retained >= max_records {
            summary.truncated = true;
            break;
        }

        let row = parser::parse_line(line);
        summary.scanned += 1;
        summary.defaulted += row.defaulted as usize;
        partition.insert(&row.record);

        let keep = filter.map_or(true, |c| c.as_str() == row.record.payment_channel);
        if keep {
            summary.retained += 1;
            retain(row.record);
        }
    }

    summary.per_channel = partition.counts();
    if summary.truncated {
        log::warn!("record cap of {max_records} reached; remaining input ignored");
    }
    if summary.defaulted > 0 {
        log::warn!("{} numeric fields were unreadable and set to 0", summary.defaulted);
    }
    (summary, partition)
}

/// Positions in `sorted` whose field equals `key`: a lower-bound binary
/// search for the first entry not less than `key`, extended forward while
/// entries still equal it. `sorted` must be ordered by `field_of`.
pub(crate) fn equal_range<'r, T>(
    sorted: &[T],
    key: &str,
    field_of: impl Fn(&T) -> &'r str,
) -> Range<usize> {
    let mut lo = 0;
    let mut hi = sorted.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if field_of(&sorted[mid]) < key {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    let start = lo;
    let mut end = start;
    while end < sorted.len() && field_of(&sorted[end]) == key {
        end += 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_range_finds_the_run() {
        let keys = ["ACH", "ACH", "UPI", "card", "card", "card", "wire_transfer"];
        assert_eq!(equal_range(&keys, "card", |k| *k), 3..6);
        assert_eq!(equal_range(&keys, "ACH", |k| *k), 0..2);
        assert_eq!(equal_range(&keys, "wire_transfer", |k| *k), 6..7);
    }

    #[test]
    fn equal_range_misses_are_empty() {
        let keys = ["b", "d", "f"];
        assert!(equal_range(&keys, "a", |k| *k).is_empty());
        assert!(equal_range(&keys, "c", |k| *k).is_empty());
        assert!(equal_range(&keys, "z", |k| *k).is_empty());
        let none: [&str; 0] = [];
        assert!(equal_range(&none, "a", |k| *k).is_empty());
    }

    #[test]
    fn ingest_skips_header_and_blank_lines() {
        let input = format!(
            "{}\n\nT1,ts,a,b,1,deposit,m,NY,d,false,f,,,,,card,ip,h\n   \nT2,ts,a,b,2,deposit,m,LA,d,false,f,,,,,UPI,ip,h\n",
            parser::HEADER
        );
        let mut kept = Vec::new();
        let (summary, partition) = ingest(&mut input.lines(), None, 10, |r| kept.push(r));
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.retained, 2);
        assert!(!summary.truncated);
        assert_eq!(partition.counts().as_array(), [1, 0, 1, 0]);
        assert_eq!(kept[1].location, "LA");
    }

    #[test]
    fn filter_must_name_a_known_channel() {
        assert_eq!(parse_filter(None).unwrap(), None);
        assert_eq!(parse_filter(Some("UPI")).unwrap(), Some(PaymentChannel::Upi));
        assert!(parse_filter(Some("upi")).unwrap_err().is_invalid_argument());
    }
}
