// src/models/stats_models.rs - Run-level statistics records

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethodType {
    ManufacturerPrefix,
}

impl MatchMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethodType::ManufacturerPrefix => "manufacturer_prefix",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchMethodStats {
    pub method_type: MatchMethodType,
    /// Distinct values fed into the comparison.
    pub values_total: usize,
    /// Distinct raw values that ended up in at least one mapping entry.
    pub values_matched: usize,
    /// Match groups, one per distinct common prefix.
    pub groups_created: usize,
    /// Deduplicated (raw value, canonical key) pairs emitted.
    pub mapping_entries: usize,
    pub avg_group_size: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub description: Option<String>,
    pub total_airplanes: usize,
    pub distinct_manufacturers: usize,
    pub total_comparisons: usize,
    pub total_matches: usize,
    pub loading_time: f64,
    pub matching_time: f64,
    pub write_time: f64,
    pub total_processing_time: f64,
    pub method_stats: Vec<MatchMethodStats>,
}
