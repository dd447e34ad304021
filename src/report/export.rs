//! JSON export for stored datasets.
//!
//! Timestamps are exported both as unix milliseconds and as formatted UTC
//! strings; the statistics bundle is exported decoded, or `null` when the
//! stored copy is missing or unreadable.

use crate::types::{format_timestamp, DatasetDetail, DatasetSummary};
use serde_json::{json, Value};
use std::io::Write;

/// One dataset with its summary and every record.
pub fn dataset_json(detail: &DatasetDetail) -> Value {
    let dataset = &detail.dataset;
    json!({
        "id": dataset.id,
        "source_name": dataset.source_name,
        "created_at": dataset.created_at,
        "uploaded": format_timestamp(&dataset.created_at_utc()),
        "summary": dataset.statistics(),
        "record_count": detail.records.len(),
        "records": detail.records,
    })
}

/// Dataset listing, in the order given.
pub fn summaries_json(summaries: &[DatasetSummary]) -> Value {
    let items: Vec<Value> = summaries
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "source_name": s.source_name,
                "created_at": s.created_at,
                "uploaded": format_timestamp(&s.created_at_utc()),
                "record_count": s.record_count,
                "summary": s.summary,
            })
        })
        .collect();
    Value::Array(items)
}

/// Pretty-print `value` followed by a newline.
pub fn write_json<W: Write>(mut writer: W, value: &Value) -> crate::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate;
    use crate::types::{Dataset, RawRow, Record};

    fn detail(statistics_json: Option<String>) -> DatasetDetail {
        DatasetDetail {
            dataset: Dataset {
                id: 9,
                owner: "alice".to_string(),
                source_name: "plant.csv".to_string(),
                created_at: 1_700_000_000_000,
                statistics_json,
            },
            records: vec![Record {
                id: 1,
                dataset_id: 9,
                name: "P1".to_string(),
                category: "Pump".to_string(),
                flowrate: 10.0,
                pressure: 5.0,
                temperature: 300.0,
            }],
        }
    }

    #[test]
    fn test_dataset_json_fields() {
        let bundle = aggregate(&[RawRow::new("P1", "Pump", 10.0, 5.0, 300.0)]).unwrap();
        let value = dataset_json(&detail(Some(bundle.to_json().unwrap())));
        assert_eq!(value["id"], 9);
        assert_eq!(value["uploaded"], "2023-11-14 22:13:20");
        assert_eq!(value["summary"]["total_count"], 1);
        assert_eq!(value["records"][0]["name"], "P1");
        assert_eq!(value["record_count"], 1);
    }

    #[test]
    fn test_missing_bundle_exports_null() {
        let value = dataset_json(&detail(None));
        assert!(value["summary"].is_null());
    }

    #[test]
    fn test_summaries_json_keeps_order() {
        let summaries = vec![
            DatasetSummary { id: 2, source_name: "b.csv".to_string(), created_at: 2, summary: None, record_count: 0 },
            DatasetSummary { id: 1, source_name: "a.csv".to_string(), created_at: 1, summary: None, record_count: 4 },
        ];
        let value = summaries_json(&summaries);
        assert_eq!(value[0]["id"], 2);
        assert_eq!(value[1]["record_count"], 4);
    }

    #[test]
    fn test_write_json_ends_with_newline() {
        let mut out = Vec::new();
        write_json(&mut out, &json!({"a": 1})).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("}\n"));
    }
}
