//! Statistics aggregation over validated equipment rows.
//!
//! Produces the [`StatisticsBundle`] stored alongside every dataset: overall
//! count, mean/min/max per measurement, the per-type distribution, and
//! per-type means. All reported values are rounded to two decimals with
//! [`round2`], which rounds half away from zero.

use crate::error::StatsError;
use crate::types::{Measurement, RawRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Round to two decimal places, halves away from zero.
///
/// Values too large to scale by 100 have no fractional digits and are
/// returned unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Format a value with the same two-decimal rule used for aggregation.
pub fn format_decimal(value: f64) -> String {
    // + 0.0 turns a rounded -0.0 into 0.0
    format!("{:.2}", round2(value) + 0.0)
}

/// Per-type means for the three measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryMeans {
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl CategoryMeans {
    pub fn get(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.flowrate,
            Measurement::Pressure => self.pressure,
            Measurement::Temperature => self.temperature,
        }
    }
}

/// Summary statistics for one dataset.
///
/// Maps are keyed by type name in byte order, so serializing the same rows
/// always yields the same JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsBundle {
    pub total_count: usize,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub min_flowrate: f64,
    pub max_flowrate: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub type_distribution: BTreeMap<String, usize>,
    pub avg_by_type: BTreeMap<String, CategoryMeans>,
}

impl StatisticsBundle {
    pub fn mean(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.avg_flowrate,
            Measurement::Pressure => self.avg_pressure,
            Measurement::Temperature => self.avg_temperature,
        }
    }

    pub fn min(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.min_flowrate,
            Measurement::Pressure => self.min_pressure,
            Measurement::Temperature => self.min_temperature,
        }
    }

    pub fn max(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Flowrate => self.max_flowrate,
            Measurement::Pressure => self.max_pressure,
            Measurement::Temperature => self.max_temperature,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Running mean/min/max for one measurement
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    mean: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl Accumulator {
    fn new() -> Self {
        Self { mean: 0.0, min: f64::INFINITY, max: f64::NEG_INFINITY, count: 0 }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        let n = self.count as f64;
        // both terms are at most f64::MAX / 2 once n >= 2, so this never overflows
        self.mean += value / n - self.mean / n;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Mean clamped into [min, max] so float drift never breaks the ordering
    fn mean(&self) -> f64 {
        self.mean.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy)]
struct MeasurementSet([Accumulator; 3]);

impl MeasurementSet {
    fn new() -> Self {
        Self([Accumulator::new(); 3])
    }

    fn push(&mut self, row: &RawRow) {
        for (acc, m) in self.0.iter_mut().zip(Measurement::ALL) {
            acc.push(row.measurement(m));
        }
    }

    fn get(&self, measurement: Measurement) -> &Accumulator {
        match measurement {
            Measurement::Flowrate => &self.0[0],
            Measurement::Pressure => &self.0[1],
            Measurement::Temperature => &self.0[2],
        }
    }

    fn rounded_means(&self) -> CategoryMeans {
        CategoryMeans {
            flowrate: round2(self.get(Measurement::Flowrate).mean()),
            pressure: round2(self.get(Measurement::Pressure).mean()),
            temperature: round2(self.get(Measurement::Temperature).mean()),
        }
    }
}

/// Aggregate validated rows into a statistics bundle.
///
/// The parser never hands over an empty row set; an empty slice is still
/// reported as [`StatsError::NoRows`] instead of producing NaN means.
pub fn aggregate(rows: &[RawRow]) -> Result<StatisticsBundle, StatsError> {
    if rows.is_empty() {
        return Err(StatsError::NoRows);
    }

    let mut overall = MeasurementSet::new();
    let mut by_type: BTreeMap<&str, MeasurementSet> = BTreeMap::new();

    for row in rows {
        overall.push(row);
        by_type.entry(row.category.as_str()).or_insert_with(MeasurementSet::new).push(row);
    }

    let type_distribution = by_type.iter().map(|(name, set)| (name.to_string(), set.0[0].count)).collect();
    let avg_by_type = by_type.iter().map(|(name, set)| (name.to_string(), set.rounded_means())).collect();

    let means = overall.rounded_means();
    let flow = overall.get(Measurement::Flowrate);
    let pressure = overall.get(Measurement::Pressure);
    let temperature = overall.get(Measurement::Temperature);

    Ok(StatisticsBundle {
        total_count: rows.len(),
        avg_flowrate: means.flowrate,
        avg_pressure: means.pressure,
        avg_temperature: means.temperature,
        min_flowrate: round2(flow.min),
        max_flowrate: round2(flow.max),
        min_pressure: round2(pressure.min),
        max_pressure: round2(pressure.max),
        min_temperature: round2(temperature.min),
        max_temperature: round2(temperature.max),
        type_distribution,
        avg_by_type,
    })
}

#[cfg(test)]
#[path = "stats_test.rs"]
mod stats_test;
