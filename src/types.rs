/// Core data structures for ingested equipment data
///
/// This module defines the row shape produced by the parser and the
/// persisted dataset/record shapes handed out by the store.
use crate::stats::StatisticsBundle;
use chrono::{DateTime, TimeZone, Utc};

/// Store-assigned dataset identifier
pub type DatasetId = i64;

/// Column names every upload must carry
pub const REQUIRED_COLUMNS: [&str; 5] = ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

/// One of the three numeric measurements recorded per equipment entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    Flowrate,
    Pressure,
    Temperature,
}

impl Measurement {
    pub const ALL: [Measurement; 3] = [Measurement::Flowrate, Measurement::Pressure, Measurement::Temperature];

    /// Header name in the uploaded CSV
    pub fn column(&self) -> &'static str {
        match self {
            Measurement::Flowrate => "Flowrate",
            Measurement::Pressure => "Pressure",
            Measurement::Temperature => "Temperature",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Flowrate => "flowrate",
            Measurement::Pressure => "pressure",
            Measurement::Temperature => "temperature",
        }
    }
}

/// A validated row from an uploaded CSV file
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RawRow {
    pub name: String,
    pub category: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl RawRow {
    pub fn new(name: &str, category: &str, flowrate: f64, pressure: f64, temperature: f64) -> Self {
        Self { name: name.to_string(), category: category.to_string(), flowrate, pressure, temperature }
    }

    pub fn measurement(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.flowrate,
            Measurement::Pressure => self.pressure,
            Measurement::Temperature => self.temperature,
        }
    }
}

/// A persisted equipment entry belonging to one dataset
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    pub id: i64,
    pub dataset_id: DatasetId,
    pub name: String,
    pub category: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl Record {
    pub fn measurement(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.flowrate,
            Measurement::Pressure => self.pressure,
            Measurement::Temperature => self.temperature,
        }
    }
}

/// One ingestion session
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub owner: String,
    pub source_name: String,
    /// Milliseconds since the Unix epoch (UTC)
    pub created_at: i64,
    /// Serialized [`StatisticsBundle`], written once at ingest
    pub statistics_json: Option<String>,
}

impl Dataset {
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        millis_to_utc(self.created_at)
    }

    /// Decode the stored statistics bundle, if present and readable
    pub fn statistics(&self) -> Option<StatisticsBundle> {
        let json = self.statistics_json.as_deref()?;
        StatisticsBundle::from_json(json).ok()
    }
}

/// A dataset together with its records, as returned by a scoped lookup
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetDetail {
    pub dataset: Dataset,
    pub records: Vec<Record>,
}

/// Lightweight list entry for an owner's history
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DatasetSummary {
    pub id: DatasetId,
    pub source_name: String,
    pub created_at: i64,
    pub summary: Option<StatisticsBundle>,
    pub record_count: usize,
}

impl DatasetSummary {
    pub fn created_at_utc(&self) -> DateTime<Utc> {
        millis_to_utc(self.created_at)
    }
}

/// Convert epoch milliseconds to a UTC timestamp, clamping out-of-range values to the epoch
pub fn millis_to_utc(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

/// Display format shared by reports and the CLI
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
