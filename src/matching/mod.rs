// src/matching/mod.rs - Batched parallel driver for the prefix matcher

pub mod prefix;

use anyhow::{bail, Result};
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::matching::ManufacturerMatchOutcome;
use crate::models::stats_models::{MatchMethodStats, MatchMethodType};

const COMPARISON_BATCH_SIZE: usize = 1_000;

/// Run the full manufacturer matching phase: all-pairs comparison across
/// concurrent batches, then the sequential group/union/dedupe mapping build.
///
/// Every comparison is independent and side-effect-free and the grouping
/// stage is order-independent, so partitioning the n x n pair space over the
/// runtime changes nothing observable; the merged matches are sorted before
/// the mapping build to keep the output stable.
pub async fn run_manufacturer_matching(
    values: Vec<String>,
    multi_progress: Option<&MultiProgress>,
) -> Result<ManufacturerMatchOutcome> {
    let n = values.len();
    let total_pairs = n * n;
    let batch_count = total_pairs.div_ceil(COMPARISON_BATCH_SIZE);
    info!(
        "Comparing {} distinct manufacturers ({} ordered pairs in {} batches)",
        n, total_pairs, batch_count
    );

    let batch_pb = multi_progress.map(|mp| {
        let pb = mp.add(ProgressBar::new(batch_count as u64));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "  ✈️  [{elapsed_precise}] {bar:30.green/blue} {pos}/{len} Comparing manufacturer pairs...",
                )
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb
    });

    let shared_values = Arc::new(values);
    let results = stream::iter(0..batch_count)
        .map(|batch_idx| {
            let values = Arc::clone(&shared_values);
            let pb = batch_pb.clone();
            tokio::spawn(async move {
                let start = batch_idx * COMPARISON_BATCH_SIZE;
                let end = ((batch_idx + 1) * COMPARISON_BATCH_SIZE).min(total_pairs);
                let mut local_matches = Vec::new();
                for flat in start..end {
                    let record =
                        prefix::compare_manufacturers(&values[flat / n], &values[flat % n]);
                    if prefix::is_match(&record) {
                        local_matches.push(record);
                    }
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local_matches
            })
        })
        .buffer_unordered(num_cpus::get())
        .collect::<Vec<_>>()
        .await;

    let mut matches = Vec::new();
    let mut failed_batches = 0usize;
    for result in results {
        match result {
            Ok(local_matches) => matches.extend(local_matches),
            Err(e) => {
                warn!("Comparison batch task panicked: {}", e);
                failed_batches += 1;
            }
        }
    }
    if failed_batches > 0 {
        bail!("{} comparison batches failed", failed_batches);
    }
    if let Some(pb) = batch_pb {
        pb.finish_with_message("Manufacturer comparison complete");
    }

    // buffer_unordered merges in completion order; sort so downstream output
    // does not depend on scheduling.
    matches.sort();

    let mapping = prefix::build_canonical_mapping(&matches);
    let resolved = prefix::resolve_preferred_mapping(&mapping);

    let groups_created = matches
        .iter()
        .map(|r| r.common_prefix.as_str())
        .collect::<HashSet<_>>()
        .len();
    let values_matched = mapping
        .iter()
        .map(|e| e.raw_value.as_str())
        .collect::<HashSet<_>>()
        .len();
    let stats = MatchMethodStats {
        method_type: MatchMethodType::ManufacturerPrefix,
        values_total: n,
        values_matched,
        groups_created,
        mapping_entries: mapping.len(),
        avg_group_size: if groups_created > 0 {
            mapping.len() as f64 / groups_created as f64
        } else {
            0.0
        },
    };
    info!(
        "Manufacturer matching: {} matches, {} groups, {} mapping entries",
        matches.len(),
        stats.groups_created,
        stats.mapping_entries
    );

    Ok(ManufacturerMatchOutcome {
        matches,
        mapping,
        resolved,
        stats,
    })
}
