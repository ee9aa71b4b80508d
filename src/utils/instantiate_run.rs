use crate::models::stats_models::PipelineStats;
use chrono::NaiveDateTime;
use log::info;

/// Build the stats record for a fresh pipeline run. Counters and timings
/// start at zero and are filled in as phases complete.
pub fn create_initial_pipeline_run(
    run_id: &str,
    run_timestamp: NaiveDateTime,
    description: Option<&str>,
) -> PipelineStats {
    info!("Created pipeline run record with ID: {}", run_id);

    PipelineStats {
        run_id: run_id.to_string(),
        run_timestamp,
        description: description.map(|s| s.to_string()),
        total_airplanes: 0,
        distinct_manufacturers: 0,
        total_comparisons: 0,
        total_matches: 0,
        loading_time: 0.0,
        matching_time: 0.0,
        write_time: 0.0,
        total_processing_time: 0.0,
        method_stats: Vec::new(),
    }
}
