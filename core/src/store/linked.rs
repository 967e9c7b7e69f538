//! Singly-linked store.
//!
//! Nodes live in an arena and refer to each other by index, so relinking
//! during partition, split and merge can never leave a dangling link.
//! Sorts only rewrite `next` handles; node contents never move.

use super::{equal_range, ingest, parse_filter, LoadSummary, TableStore};
use crate::{
    channel::ChannelPartition,
    config::StoreConfig,
    error::StoreResult,
    record::{Field, Record},
    result_set::ResultSet,
    types::{SortOrder, StoreKind},
};
use std::cmp::Ordering;
use std::mem::size_of;

/// Arena index of a node.
pub type NodeId = usize;

#[derive(Debug)]
struct Node {
    record: Record,
    next:   Option<NodeId>,
}

/// A non-empty run of linked nodes whose tail's `next` is `None`.
#[derive(Debug, Clone, Copy)]
struct Chain {
    head: NodeId,
    tail: NodeId,
}

pub struct LinkedStore {
    max_records: usize,
    /// Arena position is load order.
    nodes:       Vec<Node>,
    head:        Option<NodeId>,
    tail:        Option<NodeId>,
    partition:   ChannelPartition,
}

impl LinkedStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_max_records(config.max_records)
    }

    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            max_records,
            nodes:     Vec::new(),
            head:      None,
            tail:      None,
            partition: ChannelPartition::new(),
        }
    }

    /// Records in link order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { nodes: &self.nodes, cur: self.head }
    }

    /// Last node of the chain.
    pub fn tail(&self) -> Option<&Record> {
        self.tail.map(|id| &self.nodes[id].record)
    }

    /// Node ids in link order.
    pub fn link_order(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        let mut cur = self.head;
        while let Some(id) = cur {
            ids.push(id);
            cur = self.nodes[id].next;
        }
        ids
    }

    fn location(&self, id: NodeId) -> &str {
        &self.nodes[id].record.location
    }

    /// Link every node in arena order.
    fn link_in_arena_order(&mut self) {
        let n = self.nodes.len();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.next = (i + 1 < n).then_some(i + 1);
        }
        self.head = (n > 0).then_some(0);
        self.tail = n.checked_sub(1);
    }

    /// Detach `id` and put it at the end of `chain`.
    fn append(&mut self, chain: Option<Chain>, id: NodeId) -> Chain {
        self.nodes[id].next = None;
        match chain {
            Some(c) => {
                self.nodes[c.tail].next = Some(id);
                Chain { head: c.head, tail: id }
            }
            None => Chain { head: id, tail: id },
        }
    }

    fn concat(&mut self, front: Option<Chain>, back: Chain) -> Chain {
        match front {
            Some(f) => {
                self.nodes[f.tail].next = Some(back.head);
                Chain { head: f.head, tail: back.tail }
            }
            None => back,
        }
    }

    fn set_chain(&mut self, chain: Option<Chain>) {
        self.head = chain.map(|c| c.head);
        self.tail = chain.map(|c| c.tail);
    }

    fn whole_chain(&self) -> Option<Chain> {
        Some(Chain { head: self.head?, tail: self.tail? })
    }

    // ── Quicksort ────────────────────────────────────────────────

    /// Split `chain` into less / equal / greater sub-chains around the
    /// location of its head node. Input order is kept inside each one.
    fn partition3(&mut self, chain: Chain) -> (Option<Chain>, Chain, Option<Chain>) {
        let pivot = chain.head;
        let mut less = None;
        let mut equal = None;
        let mut greater = None;

        let mut cur = Some(chain.head);
        while let Some(id) = cur {
            cur = self.nodes[id].next;
            let bucket = match self.location(id).cmp(self.location(pivot)) {
                Ordering::Less    => &mut less,
                Ordering::Equal   => &mut equal,
                Ordering::Greater => &mut greater,
            };
            *bucket = Some(self.append(*bucket, id));
        }

        // The pivot itself always lands in `equal`.
        let equal = equal.unwrap_or(Chain { head: pivot, tail: pivot });
        (less, equal, greater)
    }

    /// Three-way quicksort over sub-chains. Pending work lives on an
    /// explicit stack instead of the call stack; sorted sub-chains are
    /// concatenated onto the output as they complete, left to right.
    fn quick_sort_chain(&mut self, chain: Chain) -> Chain {
        enum Work {
            Sort(Chain),
            Emit(Chain),
        }

        let mut out: Option<Chain> = None;
        let mut work = vec![Work::Sort(chain)];
        while let Some(item) = work.pop() {
            match item {
                Work::Emit(done) => out = Some(self.concat(out, done)),
                Work::Sort(c) if c.head == c.tail => out = Some(self.concat(out, c)),
                Work::Sort(c) => {
                    let (less, equal, greater) = self.partition3(c);
                    if let Some(g) = greater {
                        work.push(Work::Sort(g));
                    }
                    work.push(Work::Emit(equal));
                    if let Some(l) = less {
                        work.push(Work::Sort(l));
                    }
                }
            }
        }
        // `work` started non-empty and every item emits at least one node.
        out.unwrap_or(chain)
    }

    // ── Mergesort ────────────────────────────────────────────────

    /// Cut the list starting at `head` after its midpoint and return the
    /// head of the second half. Slow/fast walk: the first half gets the
    /// extra node when the length is odd.
    fn split(&mut self, head: NodeId) -> Option<NodeId> {
        let mut slow = head;
        let mut fast = self.nodes[head].next;
        while let Some(f) = fast {
            let Some(f2) = self.nodes[f].next else { break };
            let Some(s) = self.nodes[slow].next else { break };
            slow = s;
            fast = self.nodes[f2].next;
        }
        self.nodes[slow].next.take()
    }

    /// Merge two location-sorted lists by relinking. Ties take from `a`.
    fn merge(&mut self, mut a: Option<NodeId>, mut b: Option<NodeId>) -> Option<NodeId> {
        let mut out: Option<Chain> = None;
        loop {
            match (a, b) {
                (Some(x), Some(y)) => {
                    if self.location(x) <= self.location(y) {
                        a = self.nodes[x].next;
                        out = Some(self.append(out, x));
                    } else {
                        b = self.nodes[y].next;
                        out = Some(self.append(out, y));
                    }
                }
                (rest, None) | (None, rest) => {
                    return match out {
                        Some(c) => {
                            self.nodes[c.tail].next = rest;
                            Some(c.head)
                        }
                        None => rest,
                    };
                }
            }
        }
    }

    fn merge_sort_list(&mut self, head: Option<NodeId>) -> Option<NodeId> {
        let h = head?;
        if self.nodes[h].next.is_none() {
            return head;
        }
        let second = self.split(h);
        let left = self.merge_sort_list(Some(h));
        let right = self.merge_sort_list(second);
        self.merge(left, right)
    }

    /// Walk from the head to find the last node.
    fn find_tail(&self) -> Option<NodeId> {
        let mut cur = self.head?;
        while let Some(next) = self.nodes[cur].next {
            cur = next;
        }
        Some(cur)
    }

    fn reverse_links(&mut self) {
        let mut prev = None;
        let mut cur = self.head;
        while let Some(id) = cur {
            cur = std::mem::replace(&mut self.nodes[id].next, prev);
            prev = Some(id);
        }
        self.tail = self.head;
        self.head = prev;
    }
}

impl TableStore for LinkedStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Linked
    }

    fn load<'a>(
        &mut self,
        lines: &mut dyn Iterator<Item = &'a str>,
        channel_filter: Option<&str>,
    ) -> StoreResult<LoadSummary> {
        let filter = parse_filter(channel_filter)?;

        let mut nodes = Vec::new();
        let (summary, partition) = ingest(lines, filter, self.max_records, |record| {
            nodes.push(Node { record, next: None })
        });

        self.nodes = nodes;
        self.partition = partition;
        self.link_in_arena_order();

        log::info!("[{}] Loaded {} rows", self.kind(), summary.retained);
        Ok(summary)
    }

    fn size(&self) -> usize {
        self.nodes.len()
    }

    fn reset(&mut self) {
        self.nodes = Vec::new();
        self.head = None;
        self.tail = None;
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

    /// Sorts a temporary buffer of references; the chain is not relinked.
    fn binary_search_by(&mut self, field: Field, key: &str) -> ResultSet {
        let mut flat: Vec<&Record> = self.iter().collect();
        flat.sort_by(|a, b| a.field(field).cmp(b.field(field)));
        let hits = equal_range(&flat, key, |&r| r.field(field));
        flat[hits].iter().map(|&r| r.clone()).collect()
    }

    fn sort_by_location(&mut self, order: SortOrder) {
        if let Some(chain) = self.whole_chain() {
            let sorted = self.quick_sort_chain(chain);
            self.set_chain(Some(sorted));
        }
        if !order.is_ascending() {
            self.reverse_links();
        }
        log::debug!("[{}] Quick-Sorted Location ({})", self.kind(), order.label());
    }

    fn sort_by_location_merge(&mut self, order: SortOrder) {
        self.head = self.merge_sort_list(self.head);
        self.tail = self.find_tail();
        if !order.is_ascending() {
            self.reverse_links();
        }
        log::debug!("[{}] Merge-Sorted Location ({})", self.kind(), order.label());
    }

    fn records_in_range(&self, start: usize, end: usize) -> ResultSet {
        self.iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .cloned()
            .collect()
    }

    fn restore_load_order(&mut self) {
        self.link_in_arena_order();
    }

    fn partition(&self) -> &ChannelPartition {
        &self.partition
    }

    fn footprint_bytes(&self) -> usize {
        self.nodes.capacity() * size_of::<Node>()
            + self.nodes.iter().map(|n| n.record.heap_bytes()).sum::<usize>()
    }
}

/// Iterator over records in link order.
pub struct Iter<'a> {
    nodes: &'a [Node],
    cur:   Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<&'a Record> {
        let nodes = self.nodes;
        let node = &nodes[self.cur?];
        self.cur = node.next;
        Some(&node.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(locations: &[&str]) -> LinkedStore {
        let lines: Vec<String> = locations
            .iter()
            .enumerate()
            .map(|(i, loc)| format!("T{i},ts,a,b,1,deposit,m,{loc},d,false,f,,,,,card,ip,h"))
            .collect();
        let mut store = LinkedStore::with_max_records(locations.len());
        store.load(&mut lines.iter().map(String::as_str), None).unwrap();
        store
    }

    fn locations(store: &LinkedStore) -> Vec<&str> {
        store.iter().map(|r| r.location.as_str()).collect()
    }

    #[test]
    fn split_gives_first_half_the_extra_node() {
        let mut store = store_with(&["a", "b", "c", "d", "e"]);
        let second = store.split(0);
        assert_eq!(second, Some(3));
        assert_eq!(store.link_order(), vec![0, 1, 2]);
    }

    #[test]
    fn quicksort_relinks_and_tracks_tail() {
        let mut store = store_with(&["M", "Z", "A", "M", "B", "Z", "M"]);
        store.sort_by_location(SortOrder::Ascending);
        assert_eq!(store.link_order(), vec![2, 4, 0, 3, 6, 1, 5]);
        assert_eq!(store.tail().map(|r| r.transaction_id.as_str()), Some("T5"));
    }

    #[test]
    fn quicksort_survives_long_sorted_input() {
        let locs: Vec<String> = (0..5_000).map(|i| format!("L{i:05}")).collect();
        let refs: Vec<&str> = locs.iter().map(String::as_str).collect();
        let mut store = store_with(&refs);
        assert_eq!(store.size(), 5_000);
        store.sort_by_location(SortOrder::Descending);
        assert_eq!(store.link_order(), (0..5_000).rev().collect::<Vec<_>>());
    }

    #[test]
    fn merge_sort_and_reverse() {
        let mut store = store_with(&["NY", "LA", "NY", "LA", "SF"]);
        store.sort_by_location_merge(SortOrder::Ascending);
        assert_eq!(store.link_order(), vec![1, 3, 0, 2, 4]);

        store.sort_by_location_merge(SortOrder::Descending);
        assert_eq!(locations(&store), vec!["SF", "NY", "NY", "LA", "LA"]);
        assert_eq!(store.tail().map(|r| r.location.as_str()), Some("LA"));
    }

    #[test]
    fn binary_search_leaves_chain_alone() {
        let mut store = store_with(&["NY", "LA", "NY"]);
        let hits = store.binary_search_by(Field::Location, "NY");
        assert_eq!(hits.ids(), vec!["T0", "T2"]);
        assert_eq!(store.link_order(), vec![0, 1, 2]);
    }
}
