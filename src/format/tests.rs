//! Tests for CSV export.

use crate::error::SnapCheckError;
use crate::format::{CsvExporter, ExportOptions, LabelOrder, describe_labels};
use crate::model::{Label, LabelSet};
use crate::store::RecordStore;

/// Two records: one blurry, one unlabeled.
fn create_basic_store() -> RecordStore {
    let mut store = RecordStore::new();
    let first = store.append("http://a/1.png");
    store.append("http://a/2.png");
    store.toggle_label(first, Label::Blurry);
    store
}

#[test]
fn test_export_exact_output() {
    let store = create_basic_store();
    let csv = CsvExporter::export(store.all(), &ExportOptions::default()).unwrap();

    assert_eq!(
        csv,
        "Link,Clasificación\n\
         \"http://a/1.png\",\"Borrosa ligeramente\"\n\
         \"http://a/2.png\",\"Sin clasificación\"\n"
    );
}

#[test]
fn test_export_empty_store_fails() {
    let mut store = create_basic_store();
    store.replace(Vec::<String>::new());

    let result = CsvExporter::export(store.all(), &ExportOptions::default());
    assert!(matches!(result, Err(SnapCheckError::EmptyExport)));
}

#[test]
fn test_export_vocabulary_order() {
    let mut store = RecordStore::new();
    let id = store.append("x");
    store.toggle_label(id, Label::Spliced);
    store.toggle_label(id, Label::Blurry);
    store.toggle_label(id, Label::Cropped);

    let csv = CsvExporter::export(store.all(), &ExportOptions::default()).unwrap();
    assert!(csv.ends_with("\"x\",\"Borrosa ligeramente; Mal recortada; Mal empalmada\"\n"));
}

#[test]
fn test_export_selection_order() {
    let labels: LabelSet = [Label::Spliced, Label::Blurry].into_iter().collect();
    let mut store = RecordStore::new();
    store.append_with_labels("x", labels);

    let options = ExportOptions::new().label_order(LabelOrder::Selection);
    let csv = CsvExporter::export(store.all(), &options).unwrap();
    assert!(csv.ends_with("\"x\",\"Mal empalmada; Borrosa ligeramente\"\n"));
}

#[test]
fn test_export_keeps_store_order() {
    let mut store = RecordStore::new();
    store.replace(["c", "a", "b"]);

    let csv = CsvExporter::export(store.all(), &ExportOptions::default()).unwrap();
    let links: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(links, vec!["\"c\"", "\"a\"", "\"b\""]);
}

#[test]
fn test_export_does_not_escape_quotes() {
    let mut store = RecordStore::new();
    store.append("http://a/\"odd\",name.png");

    let csv = CsvExporter::export(store.all(), &ExportOptions::default()).unwrap();
    assert_eq!(
        csv.lines().nth(1).unwrap(),
        "\"http://a/\"odd\",name.png\",\"Sin clasificación\""
    );
}

#[test]
fn test_describe_labels() {
    assert_eq!(
        describe_labels([Label::Cropped, Label::Blurry]),
        "Mal recortada, Borrosa ligeramente"
    );
    assert_eq!(describe_labels([]), "");
}
