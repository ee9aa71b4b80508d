// src/bin/train_delay_model.rs
use anyhow::Result;
use clap::Parser;
use dedupe_lib::models::core::FlightDelayFeature;
use dedupe_lib::training::model::{self, FittedDelayModel};
use dedupe_lib::utils::{env::load_env, read_ndjson};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "train_delay_model",
    about = "Train the flight delay random forest and persist every fitted stage"
)]
struct Args {
    /// Base path holding data/ and models/
    #[arg(long, default_value = ".")]
    base_path: PathBuf,
    /// Feature records to train on; defaults to
    /// <base_path>/data/simple_flight_delay_features.json
    #[arg(long)]
    input: Option<PathBuf>,
    /// Optional cap on the number of records used for fitting
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    load_env();
    let args = Args::parse();

    let input_path = args
        .input
        .clone()
        .unwrap_or_else(|| args.base_path.join("data/simple_flight_delay_features.json"));
    info!("Loading flight delay features from {}", input_path.display());
    let mut records: Vec<FlightDelayFeature> = read_ndjson(&input_path)?;
    let records_read = records.len();
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }
    info!(
        "Loaded {} feature records ({} after limit)",
        records_read,
        records.len()
    );

    // Check for nulls in the features before fitting
    let null_counts = model::null_counts(&records);
    let cols_with_nulls: Vec<(&String, &usize)> =
        null_counts.iter().filter(|(_, &count)| count > 0).collect();
    if cols_with_nulls.is_empty() {
        info!("No null values in any feature column");
    } else {
        for (column, count) in &cols_with_nulls {
            warn!("Column {} has {} null values", column, count);
        }
    }

    let flights = model::complete_flights(&records);
    if flights.len() < records.len() {
        warn!(
            "Dropped {} records with missing model fields",
            records.len() - flights.len()
        );
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Fitting feature stages and random forest...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let fitted = model::train_delay_model(&flights)?;
    pb.finish_with_message("Training complete");

    let written = fitted.save(&args.base_path)?;

    print_training_summary(&fitted, records_read, &written);
    Ok(())
}

fn print_training_summary(fitted: &FittedDelayModel, records_read: usize, written: &[PathBuf]) {
    println!("\n=== FLIGHT DELAY MODEL TRAINING SUMMARY ===");
    println!("Records read: {}", records_read);
    println!("Records used for fitting: {}", fitted.training_rows);
    println!("Feature vector width: {}", fitted.feature_width);
    println!("Label distribution (ArrDelayBucket): {:?}", fitted.label_counts);
    println!("Artifacts written:");
    for path in written {
        println!("  {}", path.display());
    }
    println!("\nTo score flights, load the artifacts from the same base path.");
}
