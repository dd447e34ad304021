/// End-to-end tests for the upload → store → report pipeline
///
/// These run against on-disk databases in temporary directories and the
/// CSV fixtures under tests/fixtures.
use chemviz::error::{Error, ParseError, StoreError};
use chemviz::report;
use chemviz::service::{report_file_name, Service};
use chemviz::store::{RecordStore, RetentionPolicy};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Helper to get the CSV fixtures directory
fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixtures_dir().join(name)).unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e))
}

fn file_service(dir: &tempfile::TempDir, limit: usize) -> Service {
    let store = RecordStore::open(&dir.path().join("chemviz.db"), RetentionPolicy::new(limit).unwrap()).unwrap();
    Service::new(store)
}

#[test]
fn test_reference_upload_and_report() {
    let dir = tempfile::TempDir::new().unwrap();
    let service = file_service(&dir, 5);

    let outcome = service.upload("alice", "reference.csv", &fixture("reference.csv")).unwrap();
    assert_eq!(outcome.summary.total_count, 3);
    assert_eq!(outcome.summary.avg_flowrate, 10.33);
    assert_eq!(outcome.summary.type_distribution.get("Pump"), Some(&2));
    assert_eq!(outcome.summary.type_distribution.get("Valve"), Some(&1));

    let listed = service.list("alice").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, outcome.dataset_id);

    let bytes = service.render_report("alice", outcome.dataset_id).unwrap();
    let pdf = lopdf::Document::load_mem(&bytes).unwrap();
    assert!(!pdf.get_pages().is_empty());

    let detail = service.get("alice", outcome.dataset_id).unwrap();
    assert_eq!(report_file_name(&detail.dataset), format!("report_reference.csv_{}.pdf", outcome.dataset_id));
}

#[test]
fn test_larger_fixture_summary() {
    let dir = tempfile::TempDir::new().unwrap();
    let service = file_service(&dir, 5);

    let outcome = service.upload("alice", "plant_a.csv", &fixture("plant_a.csv")).unwrap();
    let summary = &outcome.summary;
    assert_eq!(summary.total_count, 8);
    assert_eq!(summary.type_distribution.values().sum::<usize>(), 8);
    assert_eq!(summary.type_distribution.len(), 6);
    assert!(summary.min_flowrate <= summary.avg_flowrate && summary.avg_flowrate <= summary.max_flowrate);
    assert_eq!(summary.avg_flowrate, 105.26);

    let names: Vec<String> =
        service.get("alice", outcome.dataset_id).unwrap().records.into_iter().map(|r| r.name).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_rejected_uploads_leave_store_untouched() {
    let dir = tempfile::TempDir::new().unwrap();
    let service = file_service(&dir, 5);

    let err = service.upload("alice", "missing_pressure.csv", &fixture("missing_pressure.csv")).unwrap_err();
    match err {
        Error::Parse(ParseError::MissingColumns(columns)) => assert_eq!(columns, vec!["Pressure".to_string()]),
        other => panic!("unexpected error: {:?}", other),
    }

    let err = service.upload("alice", "bad_number.csv", &fixture("bad_number.csv")).unwrap_err();
    match err {
        Error::Parse(ParseError::BadNumericField { line, column, value }) => {
            assert_eq!(line, 3);
            assert_eq!(column, "Flowrate");
            assert_eq!(value, "fast");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(service.list("alice").unwrap().is_empty());
}

#[test]
fn test_retention_window_across_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut ids = Vec::new();
    for i in 0..4 {
        // a fresh store per upload, as separate CLI invocations would do
        let service = file_service(&dir, 3);
        ids.push(service.upload("alice", &format!("run{}.csv", i), &fixture("reference.csv")).unwrap().dataset_id);
    }

    let service = file_service(&dir, 3);
    let listed: Vec<i64> = service.list("alice").unwrap().iter().map(|s| s.id).collect();
    assert_eq!(listed, vec![ids[3], ids[2], ids[1]]);
    assert!(service.get("alice", ids[0]).unwrap_err().is_not_found());
}

#[test]
fn test_owners_are_isolated() {
    let dir = tempfile::TempDir::new().unwrap();
    let service = file_service(&dir, 1);

    let alice = service.upload("alice", "a.csv", &fixture("reference.csv")).unwrap().dataset_id;
    let bob = service.upload("bob", "b.csv", &fixture("plant_a.csv")).unwrap().dataset_id;

    // bob's upload must not evict alice's only dataset
    assert!(service.get("alice", alice).is_ok());
    assert!(matches!(service.get("alice", bob), Err(Error::Store(StoreError::NotFound { .. }))));
    assert!(matches!(service.delete("bob", alice), Err(Error::Store(StoreError::NotFound { .. }))));
    assert!(service.render_report("alice", bob).unwrap_err().is_not_found());
}

#[test]
fn test_concurrent_uploads_never_exceed_cap() {
    let dir = tempfile::TempDir::new().unwrap();
    let service = Arc::new(file_service(&dir, 2));
    let bytes = Arc::new(fixture("reference.csv"));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let service = Arc::clone(&service);
            let bytes = Arc::clone(&bytes);
            std::thread::spawn(move || service.upload("alice", &format!("t{}.csv", i), &bytes).map(|o| o.dataset_id))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(service.list("alice").unwrap().len(), 2);
}

#[test]
fn test_text_report_matches_pdf_layout() {
    let dir = tempfile::TempDir::new().unwrap();
    let service = file_service(&dir, 5);
    let id = service.upload("alice", "reference.csv", &fixture("reference.csv")).unwrap().dataset_id;
    let detail = service.get("alice", id).unwrap();

    let doc = report::build_report(&detail.dataset, &detail.records, chrono::Utc::now()).unwrap();
    let text = report::render_text(&doc, false, 100);
    for table in &doc.tables {
        assert!(text.contains(&table.heading));
    }
    assert!(text.contains("Filename: reference.csv"));
}
