//! Owned query results.
//!
//! A ResultSet holds its own copies of records. Resetting or reloading the
//! store that produced it never changes it.

use crate::record::Record;
use serde::Serialize;
use std::ops::Index;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<Record>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    /// Transaction ids in result order. Handy for comparing orderings.
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.transaction_id.as_str()).collect()
    }

    /// Number of pages of `page_size` rows; zero for an empty set.
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.records.len().div_ceil(page_size)
    }

    /// A zero-based page, with the index clamped to the last page.
    /// Returns `None` when there is nothing to show.
    pub fn page(&self, index: usize, page_size: usize) -> Option<Page<'_>> {
        let pages = self.page_count(page_size);
        if pages == 0 {
            return None;
        }
        let index = index.min(pages - 1);
        let start = index * page_size;
        let end = (start + page_size).min(self.records.len());
        Some(Page {
            number: index + 1,
            pages,
            total:  self.records.len(),
            rows:   &self.records[start..end],
        })
    }

    pub fn heap_bytes(&self) -> usize {
        self.records.capacity() * std::mem::size_of::<Record>()
            + self.records.iter().map(Record::heap_bytes).sum::<usize>()
    }
}

impl Index<usize> for ResultSet {
    type Output = Record;

    fn index(&self, i: usize) -> &Record {
        &self.records[i]
    }
}

impl From<Vec<Record>> for ResultSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl FromIterator<Record> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One page of a result set, numbered from 1.
#[derive(Debug, Clone, Serialize)]
pub struct Page<'a> {
    pub number: usize,
    pub pages:  usize,
    pub total:  usize,
    pub rows:   &'a [Record],
}

impl Page<'_> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(n: usize) -> ResultSet {
        (0..n)
            .map(|i| Record { transaction_id: format!("T{i}"), ..Record::default() })
            .collect()
    }

    #[test]
    fn pages_of_five() {
        let set = set_of(12);
        assert_eq!(set.page_count(5), 3);

        let first = set.page(0, 5).unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.rows.len(), 5);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = set.page(2, 5).unwrap();
        assert_eq!(last.rows.len(), 2);
        assert_eq!(last.rows[0].transaction_id, "T10");
        assert!(!last.has_next());
    }

    #[test]
    fn page_index_is_clamped() {
        let set = set_of(7);
        assert_eq!(set.page(99, 5).unwrap().number, 2);
    }

    #[test]
    fn empty_set_has_no_pages() {
        let set = ResultSet::new();
        assert_eq!(set.page_count(5), 0);
        assert!(set.page(0, 5).is_none());
        assert!(set_of(3).page(0, 0).is_none());
    }
}
