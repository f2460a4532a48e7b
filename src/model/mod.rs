//! Data models for SnapCheck.

mod label;
mod record;

pub use label::{Label, LabelSet};
pub use record::{Record, RecordId};
