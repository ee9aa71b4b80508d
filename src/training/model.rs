// src/training/model.rs - Feature assembly, random forest fit, and artifact persistence

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::models::core::FlightDelayFeature;
use crate::training::features::{
    Bucketizer, CategoricalPipeline, VectorAssembler, DELAY_BUCKET_SPLITS,
};

/// Categorical columns one-hot encoded into the feature vector, in final
/// assembly order.
pub const CATEGORICAL_COLUMNS: [&str; 8] = [
    "Carrier",
    "DayOfMonth",
    "DayOfWeek",
    "DayOfYear",
    "Origin",
    "Dest",
    "FlightNum",
    "DepDelayBucket",
];

/// Continuous columns combined by the numeric vector assembler.
pub const NUMERIC_COLUMNS: [&str; 2] = ["DepDelay", "Distance"];

const RANDOM_FOREST_SEED: u64 = 42;
const MODEL_FILE: &str = "random_forest_classifier.flight_delays.json";
const METADATA_FILE: &str = "training_metadata.json";

type DelayForest = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// A feature record with every field the model consumes present.
#[derive(Debug, Clone)]
pub struct CompleteFlight {
    pub arr_delay: f64,
    pub dep_delay: f64,
    pub carrier: String,
    pub day_of_month: i32,
    pub day_of_week: i32,
    pub day_of_year: i32,
    pub origin: String,
    pub dest: String,
    pub flight_num: String,
    pub distance: f64,
}

/// Per-column null counts over the raw records, for every schema column.
pub fn null_counts(records: &[FlightDelayFeature]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut count = |column: &str, is_null: bool| {
        let entry = counts.entry(column.to_string()).or_insert(0);
        if is_null {
            *entry += 1;
        }
    };
    for record in records {
        count("ArrDelay", record.arr_delay.is_none());
        count("CRSArrTime", record.crs_arr_time.is_none());
        count("CRSDepTime", record.crs_dep_time.is_none());
        count("Carrier", record.carrier.is_none());
        count("DayOfMonth", record.day_of_month.is_none());
        count("DayOfWeek", record.day_of_week.is_none());
        count("DayOfYear", record.day_of_year.is_none());
        count("DepDelay", record.dep_delay.is_none());
        count("Dest", record.dest.is_none());
        count("Distance", record.distance.is_none());
        count("FlightDate", record.flight_date.is_none());
        count("FlightNum", record.flight_num.is_none());
        count("Origin", record.origin.is_none());
    }
    counts
}

/// Keep the records where every field the model consumes is present. The
/// schedule timestamps and flight date are not features, so a record missing
/// only those still trains.
pub fn complete_flights(records: &[FlightDelayFeature]) -> Vec<CompleteFlight> {
    records
        .iter()
        .filter_map(|r| {
            Some(CompleteFlight {
                arr_delay: r.arr_delay?,
                dep_delay: r.dep_delay?,
                carrier: r.carrier.clone()?,
                day_of_month: r.day_of_month?,
                day_of_week: r.day_of_week?,
                day_of_year: r.day_of_year?,
                origin: r.origin.clone()?,
                dest: r.dest.clone()?,
                flight_num: r.flight_num.clone()?,
                distance: r.distance?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrainingMetadata {
    feature_width: usize,
    training_rows: usize,
    label_counts: BTreeMap<u32, usize>,
}

/// The fitted delay model: every feature stage plus the forest itself.
pub struct FittedDelayModel {
    pub arrival_bucketizer: Bucketizer,
    pub departure_bucketizer: Bucketizer,
    pub categorical_pipelines: Vec<CategoricalPipeline>,
    pub numeric_assembler: VectorAssembler,
    pub final_assembler: VectorAssembler,
    pub forest: DelayForest,
    pub feature_width: usize,
    pub training_rows: usize,
    pub label_counts: BTreeMap<u32, usize>,
}

/// Bucketize the delays, fit the per-column categorical stages, assemble the
/// final feature vectors, and fit the random forest on all rows with the
/// arrival bucket as label.
pub fn train_delay_model(flights: &[CompleteFlight]) -> Result<FittedDelayModel> {
    if flights.is_empty() {
        bail!("No complete flight records to train on");
    }

    let arrival_bucketizer = Bucketizer::new("ArrDelay", "ArrDelayBucket", &DELAY_BUCKET_SPLITS)?;
    let departure_bucketizer = Bucketizer::new("DepDelay", "DepDelayBucket", &DELAY_BUCKET_SPLITS)?;

    let labels = flights
        .iter()
        .map(|f| arrival_bucketizer.bucket_for(f.arr_delay))
        .collect::<Result<Vec<u32>>>()?;
    let dep_buckets = flights
        .iter()
        .map(|f| departure_bucketizer.bucket_for(f.dep_delay))
        .collect::<Result<Vec<u32>>>()?;

    let mut categorical_pipelines = Vec::with_capacity(CATEGORICAL_COLUMNS.len());
    let mut categorical_blocks: Vec<Vec<Vec<f64>>> = Vec::with_capacity(CATEGORICAL_COLUMNS.len());
    for column in CATEGORICAL_COLUMNS {
        let values = categorical_values(column, flights, &dep_buckets);
        let pipeline = CategoricalPipeline::fit(column, &values);
        debug!(
            "Fitted {} stage with {} distinct labels",
            column,
            pipeline.indexer.num_labels()
        );
        categorical_blocks.push(pipeline.transform(&values)?);
        categorical_pipelines.push(pipeline);
    }

    let numeric_assembler = VectorAssembler::new(&NUMERIC_COLUMNS, "NumericFeatures_vec");
    let numeric_block = numeric_columns(flights, &numeric_assembler)?;

    let final_input_cols: Vec<String> = CATEGORICAL_COLUMNS
        .iter()
        .map(|c| format!("{}_vec", c))
        .chain(std::iter::once("NumericFeatures_vec".to_string()))
        .collect();
    let final_assembler = VectorAssembler::new(&final_input_cols, "Features_vec");

    let rows = assemble_rows(&final_assembler, &categorical_blocks, &numeric_block)?;
    let feature_width = rows[0].len();

    let x = DenseMatrix::from_2d_vec(&rows);
    let params = RandomForestClassifierParameters::default().with_seed(RANDOM_FOREST_SEED);
    let forest = RandomForestClassifier::fit(&x, &labels, params)
        .map_err(|e| anyhow!("Random forest fit failed: {}", e))?;

    let mut label_counts: BTreeMap<u32, usize> = BTreeMap::new();
    for label in &labels {
        *label_counts.entry(*label).or_insert(0) += 1;
    }
    info!(
        "Fitted random forest on {} rows x {} features (label distribution: {:?})",
        flights.len(),
        feature_width,
        label_counts
    );

    Ok(FittedDelayModel {
        arrival_bucketizer,
        departure_bucketizer,
        categorical_pipelines,
        numeric_assembler,
        final_assembler,
        forest,
        feature_width,
        training_rows: flights.len(),
        label_counts,
    })
}

impl FittedDelayModel {
    /// Predict arrival delay buckets for records transformed with the fitted
    /// stages. Fails on labels never seen during fit.
    pub fn predict(&self, flights: &[CompleteFlight]) -> Result<Vec<u32>> {
        if flights.is_empty() {
            return Ok(Vec::new());
        }
        let dep_buckets = flights
            .iter()
            .map(|f| self.departure_bucketizer.bucket_for(f.dep_delay))
            .collect::<Result<Vec<u32>>>()?;
        let mut categorical_blocks = Vec::with_capacity(self.categorical_pipelines.len());
        for pipeline in &self.categorical_pipelines {
            let values = categorical_values(&pipeline.column, flights, &dep_buckets);
            categorical_blocks.push(pipeline.transform(&values)?);
        }
        let numeric_block = numeric_columns(flights, &self.numeric_assembler)?;
        let rows = assemble_rows(&self.final_assembler, &categorical_blocks, &numeric_block)?;
        let x = DenseMatrix::from_2d_vec(&rows);
        self.forest
            .predict(&x)
            .map_err(|e| anyhow!("Random forest predict failed: {}", e))
    }

    /// Write every fitted stage and the model under `<base_path>/models/`,
    /// overwriting previous artifacts. Returns the written paths.
    pub fn save(&self, base_path: &Path) -> Result<Vec<PathBuf>> {
        let models_dir = base_path.join("models");
        fs::create_dir_all(&models_dir)
            .with_context(|| format!("Failed to create {}", models_dir.display()))?;

        let mut written = Vec::new();
        written.push(write_artifact(
            &models_dir,
            "arrival_bucketizer.json",
            &self.arrival_bucketizer,
        )?);
        written.push(write_artifact(
            &models_dir,
            "departure_bucketizer.json",
            &self.departure_bucketizer,
        )?);
        for pipeline in &self.categorical_pipelines {
            written.push(write_artifact(
                &models_dir,
                &format!("string_indexer_pipeline_model_{}.json", pipeline.column),
                pipeline,
            )?);
        }
        written.push(write_artifact(
            &models_dir,
            "numeric_vector_assembler.json",
            &self.numeric_assembler,
        )?);
        written.push(write_artifact(
            &models_dir,
            "final_vector_assembler.json",
            &self.final_assembler,
        )?);
        written.push(write_artifact(&models_dir, MODEL_FILE, &self.forest)?);
        written.push(write_artifact(
            &models_dir,
            METADATA_FILE,
            &TrainingMetadata {
                feature_width: self.feature_width,
                training_rows: self.training_rows,
                label_counts: self.label_counts.clone(),
            },
        )?);
        info!("Wrote {} model artifacts to {}", written.len(), models_dir.display());
        Ok(written)
    }

    /// Reload a fitted model from `<base_path>/models/`.
    pub fn load(base_path: &Path) -> Result<Self> {
        let models_dir = base_path.join("models");
        let arrival_bucketizer = read_artifact(&models_dir, "arrival_bucketizer.json")?;
        let departure_bucketizer = read_artifact(&models_dir, "departure_bucketizer.json")?;
        let mut categorical_pipelines = Vec::with_capacity(CATEGORICAL_COLUMNS.len());
        for column in CATEGORICAL_COLUMNS {
            categorical_pipelines.push(read_artifact(
                &models_dir,
                &format!("string_indexer_pipeline_model_{}.json", column),
            )?);
        }
        let numeric_assembler = read_artifact(&models_dir, "numeric_vector_assembler.json")?;
        let final_assembler = read_artifact(&models_dir, "final_vector_assembler.json")?;
        let forest: DelayForest = read_artifact(&models_dir, MODEL_FILE)?;
        let metadata: TrainingMetadata = read_artifact(&models_dir, METADATA_FILE)?;
        Ok(Self {
            arrival_bucketizer,
            departure_bucketizer,
            categorical_pipelines,
            numeric_assembler,
            final_assembler,
            forest,
            feature_width: metadata.feature_width,
            training_rows: metadata.training_rows,
            label_counts: metadata.label_counts,
        })
    }
}

fn categorical_values(
    column: &str,
    flights: &[CompleteFlight],
    dep_buckets: &[u32],
) -> Vec<String> {
    match column {
        "Carrier" => flights.iter().map(|f| f.carrier.clone()).collect(),
        "DayOfMonth" => flights.iter().map(|f| f.day_of_month.to_string()).collect(),
        "DayOfWeek" => flights.iter().map(|f| f.day_of_week.to_string()).collect(),
        "DayOfYear" => flights.iter().map(|f| f.day_of_year.to_string()).collect(),
        "Origin" => flights.iter().map(|f| f.origin.clone()).collect(),
        "Dest" => flights.iter().map(|f| f.dest.clone()).collect(),
        "FlightNum" => flights.iter().map(|f| f.flight_num.clone()).collect(),
        "DepDelayBucket" => dep_buckets.iter().map(|b| b.to_string()).collect(),
        other => unreachable!("Unknown categorical column {}", other),
    }
}

fn numeric_columns(
    flights: &[CompleteFlight],
    assembler: &VectorAssembler,
) -> Result<Vec<Vec<f64>>> {
    flights
        .iter()
        .map(|f| assembler.assemble(&[&[f.dep_delay], &[f.distance]]))
        .collect()
}

fn assemble_rows(
    final_assembler: &VectorAssembler,
    categorical_blocks: &[Vec<Vec<f64>>],
    numeric_block: &[Vec<f64>],
) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::with_capacity(numeric_block.len());
    for i in 0..numeric_block.len() {
        let mut parts: Vec<&[f64]> = Vec::with_capacity(categorical_blocks.len() + 1);
        for block in categorical_blocks {
            parts.push(&block[i]);
        }
        parts.push(&numeric_block[i]);
        rows.push(final_assembler.assemble(&parts)?);
    }
    Ok(rows)
}

fn write_artifact<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    Ok(path)
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, file_name: &str) -> Result<T> {
    let path = dir.join(file_name);
    let file = File::open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to deserialize {}", path.display()))
}
