//! Contiguous store: records never move after load; every sort and the
//! binary search reorder a separate permutation of slots instead.

use super::{equal_range, ingest, parse_filter, LoadSummary, TableStore};
use crate::{
    channel::ChannelPartition,
    config::StoreConfig,
    error::StoreResult,
    record::{Field, Record},
    result_set::ResultSet,
    types::{Slot, SortOrder, StoreKind},
};
use std::mem::size_of;

pub struct IndexedStore {
    max_records: usize,
    records:     Vec<Record>,
    /// Current iteration order. Always a permutation of `0..records.len()`.
    order:       Vec<Slot>,
    /// Merge buffer, and the less-than side of a quicksort partition.
    scratch:     Vec<Slot>,
    /// Greater-than side of a quicksort partition.
    spill:       Vec<Slot>,
    partition:   ChannelPartition,
}

impl IndexedStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_max_records(config.max_records)
    }

    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            max_records,
            records:   Vec::new(),
            order:     Vec::new(),
            scratch:   Vec::new(),
            spill:     Vec::new(),
            partition: ChannelPartition::new(),
        }
    }

    /// Slots in current iteration order.
    pub fn order(&self) -> &[Slot] {
        &self.order
    }

    /// Records in current iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.order.iter().map(move |&slot| &self.records[slot])
    }

    fn merge_sort(&mut self, field: Field) {
        self.scratch.resize(self.order.len(), 0);
        merge_sort_slots(&self.records, &mut self.order, &mut self.scratch, field);
    }

    fn quick_sort(&mut self) {
        let len = self.order.len();
        quick_sort_slots(
            &self.records,
            &mut self.order,
            &mut self.scratch,
            &mut self.spill,
            0..len,
        );
    }
}

impl TableStore for IndexedStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Indexed
    }

    fn load<'a>(
        &mut self,
        lines: &mut dyn Iterator<Item = &'a str>,
        channel_filter: Option<&str>,
    ) -> StoreResult<LoadSummary> {
        let filter = parse_filter(channel_filter)?;

        let mut records = Vec::new();
        let (summary, partition) = ingest(lines, filter, self.max_records, |r| records.push(r));

        self.order = (0..records.len()).collect();
        self.records = records;
        self.scratch.clear();
        self.spill.clear();
        self.partition = partition;

        log::info!("[{}] Loaded {} rows", self.kind(), summary.retained);
        Ok(summary)
    }

    fn size(&self) -> usize {
        self.records.len()
    }

    fn reset(&mut self) {
        self.records = Vec::new();
        self.order = Vec::new();
        self.scratch = Vec::new();
        self.spill = Vec::new();
        self.partition = ChannelPartition::new();
    }

    fn scan_by(&self, field: Field, value: &str) -> ResultSet {
        self.iter()
            .filter(|r| r.field(field) == value)
            .cloned()
            .collect()
    }

    fn by_channel(&self, choice: usize) -> StoreResult<ResultSet> {
        self.partition.by_choice(choice)
    }

    /// Leaves the store ordered by `field`. Later scans and range reads
    /// see that order until the next sort or `restore_load_order`.
    fn binary_search_by(&mut self, field: Field, key: &str) -> ResultSet {
        self.merge_sort(field);
        let records = &self.records;
        let hits = equal_range(&self.order, key, move |&slot| records[slot].field(field));
        self.order[hits]
            .iter()
            .map(|&slot| records[slot].clone())
            .collect()
    }

    fn sort_by_location(&mut self, order: SortOrder) {
        self.quick_sort();
        if !order.is_ascending() {
            self.order.reverse();
        }
        log::debug!("[{}] Quick-Sorted Location ({})", self.kind(), order.label());
    }

    fn sort_by_location_merge(&mut self, order: SortOrder) {
        self.merge_sort(Field::Location);
        if !order.is_ascending() {
            self.order.reverse();
        }
        log::debug!("[{}] Merge-Sorted Location ({})", self.kind(), order.label());
    }

    fn records_in_range(&self, start: usize, end: usize) -> ResultSet {
        let end = end.min(self.order.len());
        let start = start.min(end);
        self.order[start..end]
            .iter()
            .map(|&slot| self.records[slot].clone())
            .collect()
    }

    fn restore_load_order(&mut self) {
        for (i, slot) in self.order.iter_mut().enumerate() {
            *slot = i;
        }
    }

    fn partition(&self) -> &ChannelPartition {
        &self.partition
    }

    fn footprint_bytes(&self) -> usize {
        self.records.capacity() * size_of::<Record>()
            + self.records.iter().map(Record::heap_bytes).sum::<usize>()
            + (self.order.capacity() + self.scratch.capacity() + self.spill.capacity())
                * size_of::<Slot>()
    }
}

// ── Mergesort ─────────────────────────────────────────────────────────

/// Stable top-down mergesort of `order` by `field`.
/// `scratch` must be at least as long as `order`.
fn merge_sort_slots(records: &[Record], order: &mut [Slot], scratch: &mut [Slot], field: Field) {
    let n = order.len();
    if n < 2 {
        return;
    }
    let mid = n.div_ceil(2);
    merge_sort_slots(records, &mut order[..mid], &mut scratch[..mid], field);
    merge_sort_slots(records, &mut order[mid..], &mut scratch[mid..n], field);

    let key = |slot: Slot| records[slot].field(field);
    // Halves already in order relative to each other.
    if key(order[mid - 1]) <= key(order[mid]) {
        return;
    }

    scratch[..n].copy_from_slice(order);
    let (left, right) = scratch[..n].split_at(mid);
    let (mut i, mut j) = (0, 0);
    for out in order.iter_mut() {
        // Ties take from the left half: that is what keeps it stable.
        let take_left = j == right.len() || (i < left.len() && key(left[i]) <= key(right[j]));
        if take_left {
            *out = left[i];
            i += 1;
        } else {
            *out = right[j];
            j += 1;
        }
    }
}

// ── Quicksort ─────────────────────────────────────────────────────────

/// Three-way quicksort of `order[range]` on location, pivoting on the
/// first slot of each range. Recurses into the smaller side and loops on
/// the larger so stack depth stays logarithmic.
fn quick_sort_slots(
    records: &[Record],
    order: &mut [Slot],
    less: &mut Vec<Slot>,
    greater: &mut Vec<Slot>,
    range: std::ops::Range<usize>,
) {
    let (mut lo, mut hi) = (range.start, range.end);
    while hi - lo > 1 {
        let (lt, gt) = partition3(records, &mut order[lo..hi], less, greater);
        let (less_side, greater_side) = (lo..lo + lt, lo + gt..hi);
        if less_side.len() <= greater_side.len() {
            quick_sort_slots(records, order, less, greater, less_side);
            (lo, hi) = (greater_side.start, greater_side.end);
        } else {
            quick_sort_slots(records, order, less, greater, greater_side);
            (lo, hi) = (less_side.start, less_side.end);
        }
    }
}

/// Partition `run` into `[less | equal | greater]` around the location of
/// `run[0]`, keeping the input order inside each group so the result is
/// the same as the linked store's three sub-chains. Returns the bounds
/// `(lt, gt)`: less is `..lt`, equal is `lt..gt`, greater is `gt..`.
fn partition3(
    records: &[Record],
    run: &mut [Slot],
    less: &mut Vec<Slot>,
    greater: &mut Vec<Slot>,
) -> (usize, usize) {
    less.clear();
    greater.clear();
    let pivot = records[run[0]].location.as_str();

    // Equal slots are compacted in place at the front; the write index
    // never passes the read index.
    let mut equal = 0;
    for i in 0..run.len() {
        let slot = run[i];
        match records[slot].location.as_str().cmp(pivot) {
            std::cmp::Ordering::Less    => less.push(slot),
            std::cmp::Ordering::Equal   => {
                run[equal] = slot;
                equal += 1;
            }
            std::cmp::Ordering::Greater => greater.push(slot),
        }
    }

    let lt = less.len();
    let gt = lt + equal;
    run.copy_within(0..equal, lt);
    run[..lt].copy_from_slice(&less[..]);
    run[gt..].copy_from_slice(&greater[..]);
    (lt, gt)
}
