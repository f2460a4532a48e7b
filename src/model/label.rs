//! Defect label vocabulary and per-record label sets.

use serde::{Deserialize, Serialize};

use crate::error::SnapCheckError;

/// Defect labels an operator can assign to an image.
///
/// The vocabulary is closed. Variant order is the canonical export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Image is slightly out of focus
    Blurry,
    /// Image is badly cropped
    Cropped,
    /// Image is badly spliced together
    Spliced,
}

impl Label {
    /// Every label, in vocabulary order.
    pub const ALL: [Label; 3] = [Label::Blurry, Label::Cropped, Label::Spliced];

    /// Stable identifier used by hosts and config.
    pub fn id(&self) -> &'static str {
        match self {
            Label::Blurry => "blurry",
            Label::Cropped => "cropped",
            Label::Spliced => "spliced",
        }
    }

    /// Display string, also written to the CSV export.
    pub fn display_name(&self) -> &'static str {
        match self {
            Label::Blurry => "Borrosa ligeramente",
            Label::Cropped => "Mal recortada",
            Label::Spliced => "Mal empalmada",
        }
    }

    /// RGB color for label buttons.
    pub fn color(&self) -> [u8; 3] {
        match self {
            Label::Blurry => [239, 68, 68],
            Label::Cropped => [249, 115, 22],
            Label::Spliced => [55, 65, 81],
        }
    }

    /// Look up a label by its identifier.
    pub fn from_id(id: &str) -> Result<Self, SnapCheckError> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.id() == id)
            .ok_or_else(|| SnapCheckError::UnknownLabel(id.to_string()))
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A set of labels that also remembers the order labels were selected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    selected: Vec<Label>,
}

impl LabelSet {
    /// Create an empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the label if absent, remove it if present.
    ///
    /// Returns `true` if the label is selected afterwards.
    pub fn toggle(&mut self, label: Label) -> bool {
        if let Some(pos) = self.selected.iter().position(|l| *l == label) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(label);
            true
        }
    }

    pub fn contains(&self, label: Label) -> bool {
        self.selected.contains(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Labels in the order they were selected.
    pub fn in_selection_order(&self) -> impl Iterator<Item = Label> + '_ {
        self.selected.iter().copied()
    }

    /// Labels in vocabulary order.
    pub fn in_vocabulary_order(&self) -> impl Iterator<Item = Label> + '_ {
        Label::ALL.into_iter().filter(|label| self.contains(*label))
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for label in iter {
            if !set.contains(label) {
                set.selected.push(label);
            }
        }
        set
    }
}
