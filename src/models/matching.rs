// src/models/matching.rs - Records produced by the manufacturer prefix matcher

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::stats_models::MatchMethodStats;

/// Result of comparing two manufacturer strings. One record exists per
/// ordered pair of the comparison's Cartesian product, self-pairs included;
/// records are transient and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManufacturerComparison {
    pub manufacturer_1: String,
    pub manufacturer_2: String,
    pub common_prefix: String,
    /// Character count of `common_prefix`, not a byte count.
    pub common_prefix_len: usize,
    pub is_identical: bool,
}

/// One entry of the deduplication mapping: a raw manufacturer string and the
/// canonical key chosen for its match group. A raw value can legitimately
/// appear under two different canonical keys when it matched two groups;
/// `resolve_preferred_mapping` applies the documented tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalMapEntry {
    pub raw_value: String,
    pub canonical_key: String,
}

/// Everything the matching phase hands back to the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ManufacturerMatchOutcome {
    pub matches: Vec<ManufacturerComparison>,
    pub mapping: Vec<CanonicalMapEntry>,
    /// Mapping with at most one canonical key per raw value, longest prefix
    /// winning.
    pub resolved: BTreeMap<String, String>,
    pub stats: MatchMethodStats,
}
