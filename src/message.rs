//! Application message types for SnapCheck.
//!
//! All operator actions and loader callbacks are represented as messages in
//! the Elm architecture style.

use crate::loader::LoadEvent;
use crate::model::{Label, RecordId};

/// What a label toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTarget {
    /// The selection for the image being reviewed, committed on `Next`
    Current,
    /// A record already in the store
    Record(RecordId),
}

/// Messages that can be sent to update application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Link text area edited
    InputChanged(String),
    /// Load button pressed
    LoadRequested,
    /// The image loader reported an outcome
    LoadFinished(LoadEvent),
    /// Label button pressed
    LabelToggled(LabelTarget, Label),
    /// Commit the current image and its labels, then clear the form
    Next,
    /// Export button pressed
    ExportRequested,
    /// Error dialog dismissed
    DismissError,
}
