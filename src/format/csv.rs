//! CSV export of labeled records.

use serde::{Deserialize, Serialize};

use crate::error::SnapCheckError;
use crate::model::{Label, Record};

/// Header line of every export.
pub const CSV_HEADER: &str = "Link,Clasificación";

/// Second-column value for a record with no labels.
pub const NO_LABELS: &str = "Sin clasificación";

/// Separator between label display strings.
pub const LABEL_SEPARATOR: &str = "; ";

/// MIME type handed to the download collaborator.
pub const CSV_MIME: &str = "text/csv;charset=utf-8;";

/// Order in which a record's labels are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelOrder {
    /// Fixed vocabulary order, independent of how labels were toggled
    #[default]
    Vocabulary,
    /// The order the operator selected them in
    Selection,
}

/// Options for CSV export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub label_order: LabelOrder,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label_order(mut self, order: LabelOrder) -> Self {
        self.label_order = order;
        self
    }
}

/// Serializes records to CSV text.
///
/// Fields are wrapped in double quotes but embedded quotes and commas are not
/// escaped, matching the files operators already consume.
pub struct CsvExporter;

impl CsvExporter {
    /// Render `records` in order.
    ///
    /// Fails with [`SnapCheckError::EmptyExport`] when there is nothing to write.
    pub fn export(records: &[Record], options: &ExportOptions) -> Result<String, SnapCheckError> {
        if records.is_empty() {
            return Err(SnapCheckError::EmptyExport);
        }

        let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 64);
        csv.push_str(CSV_HEADER);
        csv.push('\n');

        for record in records {
            csv.push('"');
            csv.push_str(record.reference());
            csv.push_str("\",\"");
            csv.push_str(&Self::label_field(record, options.label_order));
            csv.push_str("\"\n");
        }

        log::info!("Exported {} record(s) to CSV", records.len());
        Ok(csv)
    }

    fn label_field(record: &Record, order: LabelOrder) -> String {
        let labels = record.labels();
        if labels.is_empty() {
            return NO_LABELS.to_string();
        }

        let names: Vec<&str> = match order {
            LabelOrder::Vocabulary => labels.in_vocabulary_order().map(|l| l.display_name()).collect(),
            LabelOrder::Selection => labels.in_selection_order().map(|l| l.display_name()).collect(),
        };
        names.join(LABEL_SEPARATOR)
    }
}

/// Display strings of a label list, joined for status text.
pub fn describe_labels(labels: impl IntoIterator<Item = Label>) -> String {
    labels
        .into_iter()
        .map(|l| l.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}
