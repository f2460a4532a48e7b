//! Record data model: one image reference and its assigned labels.

use serde::{Deserialize, Serialize};

use super::label::{Label, LabelSet};

/// Unique identifier for a record, never reused within a store.
pub type RecordId = u32;

/// An image reference together with the defect labels assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    reference: String,
    labels: LabelSet,
}

impl Record {
    /// Create a record with an empty label set.
    pub fn new(id: RecordId, reference: impl Into<String>) -> Self {
        Self::with_labels(id, reference, LabelSet::new())
    }

    /// Create a record with a pre-selected label set.
    pub fn with_labels(id: RecordId, reference: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            id,
            reference: reference.into(),
            labels,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// The image link exactly as entered.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Toggle a label. The reference is never mutated.
    pub(crate) fn toggle_label(&mut self, label: Label) -> bool {
        self.labels.toggle(label)
    }
}
