//! Export of the record store.
//!
//! Records are rendered to CSV text by [`CsvExporter`] and saved under a
//! timestamped name from [`export_filename`]. Delivering the bytes is left to
//! a [`crate::download::Downloader`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use snapcheck::format::{CsvExporter, ExportOptions, export_filename_now};
//!
//! let csv = CsvExporter::export(store.all(), &ExportOptions::default())?;
//! let name = export_filename_now("validacion");
//! ```

mod csv;
mod filename;

#[cfg(test)]
mod tests;

pub use csv::{
    CSV_HEADER, CSV_MIME, CsvExporter, ExportOptions, LABEL_SEPARATOR, LabelOrder, NO_LABELS,
    describe_labels,
};
pub use filename::{EXPORT_PREFIX, export_filename, export_filename_now};
