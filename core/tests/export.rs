//! Export tests: writing result sets to a JSON document and reading
//! them back.

use txstore_core::{
    export::{export_results, ExportDocument},
    sample::SampleGenerator,
    Field, IndexedStore, LinkedStore, SortOrder, StoreError, TableStore,
};

#[test]
fn exported_search_reads_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let lines = SampleGenerator::new(201).lines(300);
    let mut store = LinkedStore::with_max_records(1_000);
    store.load(&mut lines.iter().map(String::as_str), None).unwrap();
    store.sort_by_location(SortOrder::Descending);

    let results = store.scan_by(Field::TransactionType, "deposit");
    assert!(!results.is_empty());
    let path = dir.path().join("deposits.json");
    let header = export_results(&path, "Transaction Type: deposit", &results).unwrap();
    assert_eq!(header.record_count, results.len());

    let doc = ExportDocument::read_from(&path).unwrap();
    assert_eq!(doc.header, header);
    assert_eq!(doc.entries.len(), results.len());
    for (entry, record) in doc.entries.iter().zip(&results) {
        assert!(entry.matches(record), "{} differs", record.transaction_id);
    }
}

#[test]
fn empty_result_exports_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("none.json");
    let mut store = IndexedStore::with_max_records(10);
    let results = store.binary_search_by(Field::Location, "Nowhere");

    export_results(&path, "Location: Nowhere", &results).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Location: Nowhere");
    assert_eq!(items[0]["record_count"], 0);
}

#[test]
fn each_export_gets_its_own_id() {
    let lines = SampleGenerator::new(202).lines(20);
    let mut store = IndexedStore::with_max_records(100);
    store.load(&mut lines.iter().map(String::as_str), None).unwrap();
    let card = store.by_channel(1).unwrap();

    let a = ExportDocument::build("Channel: card", &card);
    let b = ExportDocument::build("Channel: card", &card);
    assert_ne!(a.header.export_id, b.header.export_id);
    assert_eq!(a.entries, b.entries);
}

#[test]
fn count_mismatch_is_malformed() {
    let text = r#"[
        {"title": "x", "record_count": 2, "exported_at": "2024-05-01T00:00:00Z",
         "export_id": "67e55044-10b1-426f-9247-bb680e5fe0c8"},
        {"transaction_id": "T1", "payment_channel": "card", "transaction_type": "deposit",
         "location": "NY", "amount": 1.0, "merchant_category": "retail"}
    ]"#;
    let err = ExportDocument::from_json(text).unwrap_err();
    assert!(matches!(err, StoreError::MalformedExport { .. }));

    assert!(matches!(
        ExportDocument::from_json("[]").unwrap_err(),
        StoreError::MalformedExport { .. }
    ));
    assert!(matches!(
        ExportDocument::from_json("{").unwrap_err(),
        StoreError::Serialization(_)
    ));
}

#[test]
fn overflowing_amounts_still_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let lines = [
        "T1,ts,a,b,1e999,deposit,m,NY,d,false,f,,,,,card,ip,h",
        "T2,ts,a,b,inf,deposit,m,LA,d,false,f,,,,,UPI,ip,h",
    ];
    let mut store = IndexedStore::with_max_records(10);
    let summary = store.load(&mut lines.iter().copied(), None).unwrap();
    assert_eq!(summary.defaulted, 2);

    let results = store.scan_by(Field::TransactionType, "deposit");
    let path = dir.path().join("overflow.json");
    export_results(&path, "Type=deposit", &results).unwrap();
    let doc = ExportDocument::read_from(&path).unwrap();
    assert_eq!(doc.entries.len(), 2);
    assert!(doc.entries.iter().all(|e| e.amount == 0.0));
}

#[test]
fn unwritable_path_is_an_io_error() {
    let results = txstore_core::ResultSet::new();
    let err = export_results(std::path::Path::new("/no/such/dir/out.json"), "t", &results).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}
