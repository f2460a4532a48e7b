//! Ordered record store for the current session.

use crate::model::{Label, LabelSet, Record, RecordId};

/// Owns every record of the session, in the order they were added.
///
/// Records are never removed individually; the store is only appended to,
/// replaced wholesale, or cleared.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    next_id: RecordId,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record with no labels and return its id.
    pub fn append(&mut self, reference: impl Into<String>) -> RecordId {
        self.append_with_labels(reference, LabelSet::new())
    }

    /// Append a record with labels already selected.
    pub fn append_with_labels(
        &mut self,
        reference: impl Into<String>,
        labels: LabelSet,
    ) -> RecordId {
        let id = self.allocate_id();
        self.records.push(Record::with_labels(id, reference, labels));
        log::debug!("Appended record {} ({} total)", id, self.records.len());
        id
    }

    /// Discard all records and install one fresh record per reference.
    ///
    /// Ids keep counting up across replacements, so an id from an old batch
    /// never addresses a record of the new one.
    pub fn replace<I, S>(&mut self, references: I) -> Vec<RecordId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut records = Vec::new();
        for reference in references {
            let id = self.allocate_id();
            records.push(Record::new(id, reference));
        }
        let ids = records.iter().map(Record::id).collect();
        self.records = records;
        log::debug!("Replaced store with {} record(s)", self.records.len());
        ids
    }

    /// Toggle a label on a record.
    ///
    /// Returns `false` without touching anything if the id is unknown.
    pub fn toggle_label(&mut self, id: RecordId, label: Label) -> bool {
        match self.records.iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                let selected = record.toggle_label(label);
                log::debug!(
                    "Record {}: '{}' {}",
                    id,
                    label,
                    if selected { "selected" } else { "cleared" }
                );
                true
            }
            None => {
                log::debug!("Ignoring toggle for unknown record {}", id);
                false
            }
        }
    }

    /// Read-only snapshot in store order.
    pub fn all(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_adds_unlabeled_record_at_end() {
        let mut store = RecordStore::new();
        store.append("http://a/0.png");
        let id = store.append("http://a/1.png");

        let last = store.all().last().unwrap();
        assert_eq!(last.id(), id);
        assert_eq!(last.reference(), "http://a/1.png");
        assert!(last.labels().is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = RecordStore::new();
        let a = store.append("a");
        let b = store.append("b");
        let replaced = store.replace(["c", "d"]);
        assert_ne!(a, b);
        assert!(!replaced.contains(&a));
        assert!(!replaced.contains(&b));
        assert_ne!(replaced[0], replaced[1]);
    }

    #[test]
    fn test_replace_preserves_order() {
        let mut store = RecordStore::new();
        store.append("old");
        let ids = store.replace(vec!["x".to_string(), "y".to_string(), "z".to_string()]);

        let refs: Vec<_> = store.all().iter().map(Record::reference).collect();
        assert_eq!(refs, vec!["x", "y", "z"]);
        let stored: Vec<_> = store.all().iter().map(Record::id).collect();
        assert_eq!(stored, ids);
    }

    #[test]
    fn test_replace_with_nothing_empties_store() {
        let mut store = RecordStore::new();
        store.append("a");
        let ids = store.replace(Vec::<String>::new());
        assert!(ids.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_toggle_twice_restores_labels() {
        let mut store = RecordStore::new();
        let id = store.append("a");
        store.toggle_label(id, Label::Cropped);
        let before = store.get(id).unwrap().labels().clone();

        for label in Label::ALL {
            assert!(store.toggle_label(id, label));
            assert!(store.toggle_label(id, label));
            assert_eq!(store.get(id).unwrap().labels(), &before);
        }
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let mut store = RecordStore::new();
        let id = store.append("a");
        store.toggle_label(id, Label::Blurry);
        let before = store.all().to_vec();

        assert!(!store.toggle_label(id + 100, Label::Spliced));
        assert_eq!(store.all(), before.as_slice());
    }

    #[test]
    fn test_stale_id_after_replace_is_noop() {
        let mut store = RecordStore::new();
        let old = store.append("a");
        store.replace(["b"]);
        assert!(!store.toggle_label(old, Label::Blurry));
        assert!(store.all()[0].labels().is_empty());
    }
}
