#![forbid(unsafe_code)]

//! Ordered, id-indexed snapshot of the server's record set.
//!
//! # Invariants
//!
//! 1. Every record carries an id.
//! 2. No two records share an id.
//! 3. Position order is exactly the order of the server response.
//!
//! A [`Collection`] is immutable once built. Updates happen by building a
//! new snapshot from a fresh server response and replacing the old one
//! wholesale, never by patching fields in place.

use std::collections::HashMap;
use std::fmt;

use crate::record::{Record, RecordId};

/// Reasons a server response cannot become a [`Collection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// Record at `index` has no id.
    MissingId { index: usize },
    /// Two records share `id`.
    DuplicateId(RecordId),
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId { index } => write!(f, "record at position {index} has no id"),
            Self::DuplicateId(id) => write!(f, "duplicate record id {id}"),
        }
    }
}

impl std::error::Error for CollectionError {}

/// Authoritative local snapshot of the customer collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
}

impl Collection {
    /// Empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from one server response, enforcing the invariants.
    pub fn from_records(records: Vec<Record>) -> Result<Self, CollectionError> {
        let mut index = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            let id = record.id.ok_or(CollectionError::MissingId { index: pos })?;
            if index.insert(id, pos).is_some() {
                return Err(CollectionError::DuplicateId(id));
            }
        }
        Ok(Self { records, index })
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at a render position.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Record> {
        self.records.get(position)
    }

    /// Record with the given id.
    #[must_use]
    pub fn by_id(&self, id: RecordId) -> Option<&Record> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }

    /// Render position of the record with the given id.
    #[must_use]
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    /// Records in server order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Ids in server order.
    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        // Construction guarantees every id is present.
        self.records.iter().filter_map(|r| r.id)
    }

    /// Records for a contiguous position range, clamped to bounds.
    #[must_use]
    pub fn slice(&self, range: std::ops::Range<usize>) -> &[Record] {
        let end = range.end.min(self.records.len());
        let start = range.start.min(end);
        &self.records[start..end]
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(id: i64, name: &str) -> Record {
        Record::draft(name, format!("{name}@x.com"), "1234567890", "1 Main St").with_id(RecordId(id))
    }

    #[test]
    fn indexes_by_position_and_id() {
        let c = Collection::from_records(vec![rec(3, "c"), rec(1, "a"), rec(2, "b")]).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(0).unwrap().name, "c");
        assert_eq!(c.by_id(RecordId(1)).unwrap().name, "a");
        assert_eq!(c.position(RecordId(2)), Some(2));
        assert_eq!(c.ids().collect::<Vec<_>>(), vec![RecordId(3), RecordId(1), RecordId(2)]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Collection::from_records(vec![rec(1, "a"), rec(1, "b")]).unwrap_err();
        assert_eq!(err, CollectionError::DuplicateId(RecordId(1)));
    }

    #[test]
    fn rejects_missing_ids() {
        let err = Collection::from_records(vec![rec(1, "a"), Record::draft("b", "", "", "")])
            .unwrap_err();
        assert_eq!(err, CollectionError::MissingId { index: 1 });
    }

    #[test]
    fn empty_collection() {
        let c = Collection::from_records(Vec::new()).unwrap();
        assert!(c.is_empty());
        assert_eq!(c, Collection::empty());
        assert!(!c.contains(RecordId(1)));
    }

    #[test]
    fn slice_clamps() {
        let c = Collection::from_records(vec![rec(1, "a"), rec(2, "b")]).unwrap();
        assert_eq!(c.slice(1..10).len(), 1);
        assert!(c.slice(5..9).is_empty());
    }

    proptest! {
        #[test]
        fn built_collections_have_unique_ids(ids in proptest::collection::vec(0i64..50, 0..40)) {
            let records: Vec<Record> = ids.iter().map(|&id| rec(id, "n")).collect();
            match Collection::from_records(records) {
                Ok(c) => {
                    let mut seen = std::collections::HashSet::new();
                    for id in c.ids() {
                        prop_assert!(seen.insert(id));
                    }
                    prop_assert_eq!(c.len(), ids.len());
                }
                Err(CollectionError::DuplicateId(id)) => {
                    prop_assert!(ids.iter().filter(|&&x| x == id.0).count() > 1);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
        }
    }
}
