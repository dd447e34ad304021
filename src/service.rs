//! Upload, browse and report operations over one record store.
//!
//! `Service` is the only place the pipeline stages meet: uploads go
//! parse → aggregate → ingest, reports go get → render. Nothing is written
//! unless parsing and aggregation both succeed.

use crate::error::{Result, ValidationError};
use crate::parser;
use crate::report;
use crate::stats::{self, StatisticsBundle};
use crate::store::RecordStore;
use crate::types::{Dataset, DatasetDetail, DatasetId, DatasetSummary};
use log::debug;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UploadOutcome {
    pub dataset_id: DatasetId,
    pub source_name: String,
    pub summary: StatisticsBundle,
}

/// A rendered PDF with its download name
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFile {
    pub file_name: String,
    pub pdf: Vec<u8>,
}

pub struct Service {
    store: RecordStore,
}

impl Service {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Ingest an uploaded CSV file for `owner`.
    ///
    /// `source_name` must end in `.csv`. Parse and aggregation errors are
    /// returned before anything touches the store.
    pub fn upload(&self, owner: &str, source_name: &str, bytes: &[u8]) -> Result<UploadOutcome> {
        if !source_name.ends_with(".csv") {
            return Err(ValidationError::UnsupportedFileType { name: source_name.to_string() }.into());
        }
        let rows = parser::parse(bytes)?;
        let summary = stats::aggregate(&rows)?;
        debug!("Aggregated {} rows from {}", summary.total_count, source_name);
        let dataset_id = self.store.ingest(owner, source_name, &rows, &summary)?;
        Ok(UploadOutcome { dataset_id, source_name: source_name.to_string(), summary })
    }

    /// The owner's datasets, newest first
    pub fn list(&self, owner: &str) -> Result<Vec<DatasetSummary>> {
        Ok(self.store.list(owner)?)
    }

    pub fn get(&self, owner: &str, id: DatasetId) -> Result<DatasetDetail> {
        let (dataset, records) = self.store.get(owner, id)?;
        Ok(DatasetDetail { dataset, records })
    }

    pub fn delete(&self, owner: &str, id: DatasetId) -> Result<()> {
        Ok(self.store.delete(owner, id)?)
    }

    /// PDF report for one of the owner's datasets
    pub fn render_report(&self, owner: &str, id: DatasetId) -> Result<Vec<u8>> {
        Ok(self.report_file(owner, id)?.pdf)
    }

    /// PDF report plus its file name, from a single lookup
    pub fn report_file(&self, owner: &str, id: DatasetId) -> Result<ReportFile> {
        let detail = self.get(owner, id)?;
        let pdf = report::render(&detail.dataset, &detail.records)?;
        Ok(ReportFile { file_name: report_file_name(&detail.dataset), pdf })
    }
}

/// Download name for a dataset's report: `report_<source>_<id>.pdf`.
///
/// Path separators in the source name are replaced so the result is always a
/// single file name.
pub fn report_file_name(dataset: &Dataset) -> String {
    let source: String = dataset.source_name.chars().map(|c| if c == '/' || c == '\\' { '_' } else { c }).collect();
    format!("report_{}_{}.pdf", source, dataset.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ParseError, StoreError};
    use crate::store::RetentionPolicy;

    const PLANT_CSV: &str = "\
Equipment Name,Type,Flowrate,Pressure,Temperature
P1,Pump,10,5,300
P2,Pump,20,7,310
V1,Valve,1,2,290
";

    fn service() -> Service {
        Service::new(RecordStore::open_in_memory(RetentionPolicy::default()).unwrap())
    }

    #[test]
    fn test_upload_returns_summary() {
        let service = service();
        let outcome = service.upload("alice", "plant.csv", PLANT_CSV.as_bytes()).unwrap();
        assert_eq!(outcome.source_name, "plant.csv");
        assert_eq!(outcome.summary.total_count, 3);
        assert_eq!(outcome.summary.avg_flowrate, 10.33);

        let detail = service.get("alice", outcome.dataset_id).unwrap();
        assert_eq!(detail.records.len(), 3);
        assert_eq!(detail.dataset.statistics(), Some(outcome.summary));
    }

    #[test]
    fn test_non_csv_name_rejected() {
        let err = service().upload("alice", "plant.xlsx", PLANT_CSV.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::UnsupportedFileType { .. })));
    }

    #[test]
    fn test_parse_failure_writes_nothing() {
        let service = service();
        let csv = "Equipment Name,Type,Flowrate,Temperature\nP1,Pump,1,2\n";
        let err = service.upload("alice", "bad.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::MissingColumns(ref cols)) if cols == &["Pressure"]));
        assert!(service.list("alice").unwrap().is_empty());
    }

    #[test]
    fn test_header_only_is_empty() {
        let service = service();
        let err = service.upload("alice", "h.csv", b"Equipment Name,Type,Flowrate,Pressure,Temperature\n").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::Empty)));
    }

    #[test]
    fn test_report_for_other_owner_is_not_found() {
        let service = service();
        let id = service.upload("bob", "plant.csv", PLANT_CSV.as_bytes()).unwrap().dataset_id;
        let err = service.render_report("alice", id).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, Error::Store(StoreError::NotFound { .. })));
        assert!(service.render_report("bob", id).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_report_file_carries_name_and_pdf() {
        let service = service();
        let id = service.upload("alice", "plant.csv", PLANT_CSV.as_bytes()).unwrap().dataset_id;
        let file = service.report_file("alice", id).unwrap();
        assert_eq!(file.file_name, format!("report_plant.csv_{}.pdf", id));
        assert!(file.pdf.starts_with(b"%PDF"));
        assert!(service.report_file("bob", id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_huge_measurement_upload_still_renders() {
        let service = service();
        let csv = "Equipment Name,Type,Flowrate,Pressure,Temperature\nP1,Pump,1e307,5,300\n";
        let outcome = service.upload("alice", "huge.csv", csv.as_bytes()).unwrap();
        assert_eq!(outcome.summary.avg_flowrate, 1e307);
        assert_eq!(outcome.summary.min_flowrate, 1e307);

        let listed = service.list("alice").unwrap();
        assert!(listed[0].summary.is_some());
        assert!(service.render_report("alice", outcome.dataset_id).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_report_file_name() {
        let dataset = Dataset {
            id: 12,
            owner: "alice".to_string(),
            source_name: "line/a.csv".to_string(),
            created_at: 0,
            statistics_json: None,
        };
        assert_eq!(report_file_name(&dataset), "report_line_a.csv_12.pdf");
    }
}
