use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use dedupe_lib::matching::run_manufacturer_matching;
use dedupe_lib::models::core::Airplane;
use dedupe_lib::utils::progress_bars::progress_config::ProgressConfig;
use dedupe_lib::utils::{
    env::load_env, get_memory_usage, instantiate_run::create_initial_pipeline_run, read_ndjson,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    name = "resolve_manufacturers",
    about = "Deduplicate airplane manufacturer names by shared prefix"
)]
struct Args {
    /// Airplane registry records, one JSON object per line
    #[arg(long, default_value = "data/airplanes.json")]
    input: PathBuf,
    /// Output path for the raw-value -> canonical-key mapping
    #[arg(long, default_value = "data/manufacturer_dedupe_mapping.json")]
    output: PathBuf,
    /// Also write the mapping with ambiguous raw values resolved
    /// (longest prefix wins)
    #[arg(long)]
    resolved_output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting airplane manufacturer deduplication pipeline");
    load_env();
    let args = Args::parse();

    let progress_config = ProgressConfig::from_env();
    info!(
        "Progress tracking: enabled={}, detailed={}",
        progress_config.enabled, progress_config.detailed
    );
    let multi_progress = progress_config.create_multi_progress();

    let main_pb = multi_progress.as_ref().map(|mp| {
        let pb = mp.add(ProgressBar::new(3));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        pb.set_message("Initializing pipeline...");
        pb
    });

    let mut phase_times = HashMap::new();
    let run_id = Uuid::new_v4().to_string();
    let run_timestamp = Utc::now().naive_utc();
    let mut stats = create_initial_pipeline_run(
        &run_id,
        run_timestamp,
        Some("Manufacturer prefix deduplication run"),
    );

    // Phase 1: Load the registry and select distinct manufacturers
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 1: Loading airplane registry");
    }
    let phase1_start = Instant::now();

    let airplanes: Vec<Airplane> = read_ndjson(&args.input)
        .with_context(|| format!("Failed to load airplane registry from {}", args.input.display()))?;
    stats.total_airplanes = airplanes.len();

    let distinct: BTreeSet<String> = airplanes
        .iter()
        .filter_map(|a| a.manufacturer.clone())
        .filter(|m| !m.is_empty())
        .collect();
    let manufacturers: Vec<String> = distinct.into_iter().collect();
    stats.distinct_manufacturers = manufacturers.len();
    info!(
        "Loaded {} airplanes, {} distinct manufacturers",
        stats.total_airplanes, stats.distinct_manufacturers
    );
    for manufacturer in &manufacturers {
        debug!("{}", manufacturer);
    }

    let phase1_duration = phase1_start.elapsed();
    phase_times.insert("loading".to_string(), phase1_duration);
    stats.loading_time = phase1_duration.as_secs_f64();

    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.set_message(format!(
            "Phase 1 complete: {} distinct manufacturers",
            stats.distinct_manufacturers
        ));
    }

    // Phase 2: All-pairs comparison and canonical mapping
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 2: Matching manufacturers");
    }
    let phase2_start = Instant::now();

    let matching_progress = if progress_config.should_show_detailed() {
        multi_progress.as_ref()
    } else {
        None
    };
    let outcome = run_manufacturer_matching(manufacturers, matching_progress).await?;
    stats.total_comparisons = stats.distinct_manufacturers * stats.distinct_manufacturers;
    stats.total_matches = outcome.matches.len();
    stats.method_stats.push(outcome.stats.clone());

    let phase2_duration = phase2_start.elapsed();
    phase_times.insert("matching".to_string(), phase2_duration);
    stats.matching_time = phase2_duration.as_secs_f64();

    let mut keys_per_raw: HashMap<&str, usize> = HashMap::new();
    for entry in &outcome.mapping {
        *keys_per_raw.entry(entry.raw_value.as_str()).or_insert(0) += 1;
    }
    let ambiguous = keys_per_raw.values().filter(|&&count| count > 1).count();
    if ambiguous > 0 {
        warn!(
            "{} raw values map to more than one canonical key; --resolved-output applies the longest-prefix tie-break",
            ambiguous
        );
    }

    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.set_message(format!(
            "Phase 2 complete: {} match groups",
            outcome.stats.groups_created
        ));
    }

    // Phase 3: Write outputs
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 3: Writing mapping");
    }
    let phase3_start = Instant::now();

    write_json(&args.output, &outcome.mapping)?;
    info!(
        "Wrote {} mapping entries to {}",
        outcome.mapping.len(),
        args.output.display()
    );
    if let Some(path) = &args.resolved_output {
        write_json(path, &outcome.resolved)?;
        info!(
            "Wrote {} resolved entries to {}",
            outcome.resolved.len(),
            path.display()
        );
    }

    let phase3_duration = phase3_start.elapsed();
    phase_times.insert("writing".to_string(), phase3_duration);
    stats.write_time = phase3_duration.as_secs_f64();

    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.set_message(format!(
            "Pipeline complete: {} mapping entries",
            outcome.mapping.len()
        ));
        pb.finish();
    }

    let total_time = phase1_duration + phase2_duration + phase3_duration;
    stats.total_processing_time = total_time.as_secs_f64();

    info!("=== Pipeline Summary ===");
    info!("Run ID: {}", stats.run_id);
    info!("Total airplanes: {}", stats.total_airplanes);
    info!("Distinct manufacturers: {}", stats.distinct_manufacturers);
    info!("Comparisons evaluated: {}", stats.total_comparisons);
    info!("Matches retained: {}", stats.total_matches);
    info!("Match groups: {}", outcome.stats.groups_created);
    info!("Mapping entries: {}", outcome.stats.mapping_entries);
    info!("=== Timing Breakdown ===");
    info!("Phase 1 (Load registry): {:.2?}", phase1_duration);
    info!("Phase 2 (Matching): {:.2?}", phase2_duration);
    info!("Phase 3 (Write outputs): {:.2?}", phase3_duration);
    info!("Total execution time: {:.2?}", total_time);

    if progress_config.should_show_memory() {
        let final_memory_mb = get_memory_usage().await;
        info!("Final memory usage: {} MB", final_memory_mb);
    }

    for method_stat in &stats.method_stats {
        info!(
            "{}: {} groups, {} values matched, avg group size {:.2}",
            method_stat.method_type.as_str(),
            method_stat.groups_created,
            method_stat.values_matched,
            method_stat.avg_group_size
        );
    }

    info!("Pipeline completed successfully!");
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
