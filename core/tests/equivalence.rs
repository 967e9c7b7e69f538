//! Cross-representation properties.
//!
//! For any input, the indexed and linked stores must return identical
//! results for every query, and identical orderings after every sort.

use proptest::prelude::*;
use txstore_core::{Field, IndexedStore, LinkedStore, SortOrder, TableStore};

const LOCATIONS: &[&str] = &["LA", "NY", "SF", "Austin", "austin", ""];
const CHANNELS: &[&str] = &["card", "ACH", "UPI", "wire_transfer", "cash", "Card"];
const TYPES: &[&str] = &["deposit", "transfer", "payment"];

/// A row as (location, channel, type) picks.
fn row_spec() -> impl Strategy<Value = (usize, usize, usize)> {
    (0..LOCATIONS.len(), 0..CHANNELS.len(), 0..TYPES.len())
}

fn rows(max_len: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(row_spec(), 0..=max_len).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (l, c, t))| {
                format!(
                    "R{i:04},2023-01-01T00:00:00,A,B,{i}.25,{},misc,{},web,false,,,,0,0,{},ip,h",
                    TYPES[t], LOCATIONS[l], CHANNELS[c]
                )
            })
            .collect()
    })
}

fn pair(lines: &[String], max: usize, filter: Option<&str>) -> (IndexedStore, LinkedStore) {
    let mut indexed = IndexedStore::with_max_records(max);
    let mut linked = LinkedStore::with_max_records(max);
    let a = indexed.load(&mut lines.iter().map(String::as_str), filter).unwrap();
    let b = linked.load(&mut lines.iter().map(String::as_str), filter).unwrap();
    assert_eq!(a, b);
    (indexed, linked)
}

fn all(store: &dyn TableStore) -> Vec<String> {
    store.head(store.size()).ids().into_iter().map(String::from).collect()
}

proptest! {
    #[test]
    fn loads_and_buckets_agree(
        lines in rows(60),
        max in 1usize..80,
        filter in prop::option::of(0usize..4),
    ) {
        let filter = filter.map(|i| CHANNELS[i]);
        let (indexed, linked) = pair(&lines, max, filter);
        prop_assert_eq!(all(&indexed), all(&linked));
        prop_assert!(indexed.size() <= max);
        for choice in 1..=4 {
            prop_assert_eq!(indexed.by_channel(choice).unwrap(), linked.by_channel(choice).unwrap());
        }
    }

    #[test]
    fn quicksorts_agree(lines in rows(80), descending in any::<bool>()) {
        let order = if descending { SortOrder::Descending } else { SortOrder::Ascending };
        let (mut indexed, mut linked) = pair(&lines, 1_000, None);
        indexed.sort_by_location(order);
        linked.sort_by_location(order);
        prop_assert_eq!(all(&indexed), all(&linked));
    }

    #[test]
    fn mergesorts_agree(lines in rows(80), descending in any::<bool>()) {
        let order = if descending { SortOrder::Descending } else { SortOrder::Ascending };
        let (mut indexed, mut linked) = pair(&lines, 1_000, None);
        indexed.sort_by_location_merge(order);
        linked.sort_by_location_merge(order);
        prop_assert_eq!(all(&indexed), all(&linked));
    }

    #[test]
    fn searches_agree_after_sorts(
        lines in rows(60),
        loc in 0..LOCATIONS.len(),
        kind in 0..TYPES.len(),
    ) {
        let (mut indexed, mut linked) = pair(&lines, 1_000, None);
        indexed.sort_by_location(SortOrder::Descending);
        linked.sort_by_location(SortOrder::Descending);

        prop_assert_eq!(
            indexed.scan_by(Field::Location, LOCATIONS[loc]),
            linked.scan_by(Field::Location, LOCATIONS[loc])
        );
        prop_assert_eq!(
            indexed.binary_search_by(Field::TransactionType, TYPES[kind]),
            linked.binary_search_by(Field::TransactionType, TYPES[kind])
        );
    }

    #[test]
    fn binary_search_counts_match_scan(lines in rows(60), loc in 0..LOCATIONS.len()) {
        let (mut indexed, _) = pair(&lines, 1_000, None);
        let scanned = indexed.scan_by(Field::Location, LOCATIONS[loc]).len();
        let found = indexed.binary_search_by(Field::Location, LOCATIONS[loc]).len();
        prop_assert_eq!(scanned, found);
    }

    #[test]
    fn range_reads_agree(lines in rows(40), start in 0usize..50, len in 0usize..50) {
        let (indexed, linked) = pair(&lines, 1_000, None);
        prop_assert_eq!(
            indexed.records_in_range(start, start + len),
            linked.records_in_range(start, start + len)
        );
    }
}
