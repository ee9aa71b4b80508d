// src/training/features.rs - Fit/transform feature stages for delay model training
//
// Small counterparts of the dataframe library's built-in transformers:
// bucketizer, string indexer, one-hot encoder, vector assembler. Each fitted
// stage serializes to JSON so it can be persisted next to the model and
// reloaded for scoring.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Delay bucket boundaries: on time (< 15 min), slightly late (< 60 min),
/// very late.
pub const DELAY_BUCKET_SPLITS: [f64; 4] = [f64::NEG_INFINITY, 15.0, 60.0, f64::INFINITY];

/// Maps a continuous value to the index of the split interval containing it.
/// Bucket `i` covers `[splits[i], splits[i+1])`; the last bucket is closed on
/// the right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucketizer {
    pub input_col: String,
    pub output_col: String,
    pub splits: Vec<f64>,
}

impl Bucketizer {
    pub fn new(input_col: &str, output_col: &str, splits: &[f64]) -> Result<Self> {
        if splits.len() < 3 {
            bail!("Bucketizer for {} needs at least 3 splits", input_col);
        }
        if !splits.windows(2).all(|w| w[0] < w[1]) {
            bail!(
                "Bucketizer splits for {} must be strictly increasing",
                input_col
            );
        }
        Ok(Self {
            input_col: input_col.to_string(),
            output_col: output_col.to_string(),
            splits: splits.to_vec(),
        })
    }

    pub fn num_buckets(&self) -> usize {
        self.splits.len() - 1
    }

    pub fn bucket_for(&self, value: f64) -> Result<u32> {
        if value.is_nan() {
            bail!("Cannot bucketize NaN for column {}", self.input_col);
        }
        let last = self.num_buckets() - 1;
        for i in 0..=last {
            let lower = self.splits[i];
            let upper = self.splits[i + 1];
            let in_bucket = if i == last {
                value >= lower && value <= upper
            } else {
                value >= lower && value < upper
            };
            if in_bucket {
                return Ok(i as u32);
            }
        }
        bail!(
            "Value {} for column {} falls outside the bucketizer splits",
            value,
            self.input_col
        )
    }
}

/// Assigns each distinct label an index ordered by descending frequency,
/// alphabetical on ties so fits are reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StringIndexer {
    pub input_col: String,
    pub output_col: String,
    labels: Vec<String>,
}

impl StringIndexer {
    pub fn fit(input_col: &str, output_col: &str, values: &[String]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in values {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }
        let mut ordered: Vec<(usize, &str)> =
            counts.into_iter().map(|(label, count)| (count, label)).collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        Self {
            input_col: input_col.to_string(),
            output_col: output_col.to_string(),
            labels: ordered.into_iter().map(|(_, label)| label.to_string()).collect(),
        }
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index an entire column. A label never seen during fit is an error, as
    /// the encoded vector would have no position for it.
    pub fn transform(&self, values: &[String]) -> Result<Vec<u32>> {
        let lookup: HashMap<&str, u32> = self
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| (label.as_str(), i as u32))
            .collect();
        values
            .iter()
            .map(|value| {
                lookup.get(value.as_str()).copied().ok_or_else(|| {
                    anyhow!("Unseen label '{}' for column {}", value, self.input_col)
                })
            })
            .collect()
    }
}

/// Expands a category index into an indicator vector. `drop_last = false`
/// keeps the full width, one position per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub input_col: String,
    pub output_col: String,
    pub num_categories: usize,
    pub drop_last: bool,
}

impl OneHotEncoder {
    pub fn new(input_col: &str, output_col: &str, num_categories: usize, drop_last: bool) -> Self {
        Self {
            input_col: input_col.to_string(),
            output_col: output_col.to_string(),
            num_categories,
            drop_last,
        }
    }

    pub fn width(&self) -> usize {
        if self.drop_last {
            self.num_categories.saturating_sub(1)
        } else {
            self.num_categories
        }
    }

    pub fn encode(&self, index: u32) -> Result<Vec<f64>> {
        let index = index as usize;
        if index >= self.num_categories {
            bail!(
                "Category index {} out of range for column {} ({} categories)",
                index,
                self.input_col,
                self.num_categories
            );
        }
        let mut vector = vec![0.0; self.width()];
        if index < vector.len() {
            vector[index] = 1.0;
        }
        Ok(vector)
    }
}

/// The per-column StringIndexer + OneHotEncoder pair, fitted and persisted
/// together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalPipeline {
    pub column: String,
    pub indexer: StringIndexer,
    pub encoder: OneHotEncoder,
}

impl CategoricalPipeline {
    pub fn fit(column: &str, values: &[String]) -> Self {
        let indexer = StringIndexer::fit(column, &format!("{}_index", column), values);
        let encoder = OneHotEncoder::new(
            &format!("{}_index", column),
            &format!("{}_vec", column),
            indexer.num_labels(),
            false,
        );
        Self {
            column: column.to_string(),
            indexer,
            encoder,
        }
    }

    pub fn transform(&self, values: &[String]) -> Result<Vec<Vec<f64>>> {
        let indices = self.indexer.transform(values)?;
        indices.iter().map(|&i| self.encoder.encode(i)).collect()
    }
}

/// Concatenates named input columns into one dense vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorAssembler {
    pub input_cols: Vec<String>,
    pub output_col: String,
}

impl VectorAssembler {
    pub fn new<S: AsRef<str>>(input_cols: &[S], output_col: &str) -> Self {
        Self {
            input_cols: input_cols.iter().map(|c| c.as_ref().to_string()).collect(),
            output_col: output_col.to_string(),
        }
    }

    pub fn assemble(&self, parts: &[&[f64]]) -> Result<Vec<f64>> {
        if parts.len() != self.input_cols.len() {
            bail!(
                "VectorAssembler {} expected {} input columns, got {}",
                self.output_col,
                self.input_cols.len(),
                parts.len()
            );
        }
        Ok(parts.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_bucketizer_boundaries() {
        let bucketizer = Bucketizer::new("ArrDelay", "ArrDelayBucket", &DELAY_BUCKET_SPLITS).unwrap();
        assert_eq!(bucketizer.num_buckets(), 3);
        assert_eq!(bucketizer.bucket_for(-87.0).unwrap(), 0);
        assert_eq!(bucketizer.bucket_for(0.0).unwrap(), 0);
        assert_eq!(bucketizer.bucket_for(14.9).unwrap(), 0);
        // Split values belong to the bucket above them.
        assert_eq!(bucketizer.bucket_for(15.0).unwrap(), 1);
        assert_eq!(bucketizer.bucket_for(59.9).unwrap(), 1);
        assert_eq!(bucketizer.bucket_for(60.0).unwrap(), 2);
        assert_eq!(bucketizer.bucket_for(1780.0).unwrap(), 2);
    }

    #[test]
    fn test_bucketizer_rejects_nan_and_bad_splits() {
        let bucketizer = Bucketizer::new("ArrDelay", "ArrDelayBucket", &DELAY_BUCKET_SPLITS).unwrap();
        assert!(bucketizer.bucket_for(f64::NAN).is_err());
        assert!(Bucketizer::new("x", "y", &[0.0, 1.0]).is_err());
        assert!(Bucketizer::new("x", "y", &[0.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_string_indexer_orders_by_frequency_then_alphabet() {
        let indexer = StringIndexer::fit(
            "Carrier",
            "Carrier_index",
            &strings(&["WN", "DL", "WN", "AA", "DL", "DL", "UA"]),
        );
        // DL appears 3x, WN 2x, then AA/UA tie at 1 and sort alphabetically.
        assert_eq!(indexer.labels(), &["DL", "WN", "AA", "UA"]);
        assert_eq!(
            indexer.transform(&strings(&["AA", "DL", "WN"])).unwrap(),
            vec![2, 0, 1]
        );
    }

    #[test]
    fn test_string_indexer_rejects_unseen_label() {
        let indexer = StringIndexer::fit("Carrier", "Carrier_index", &strings(&["WN", "DL"]));
        assert!(indexer.transform(&strings(&["B6"])).is_err());
    }

    #[test]
    fn test_one_hot_encoder_full_width() {
        let encoder = OneHotEncoder::new("Carrier_index", "Carrier_vec", 4, false);
        assert_eq!(encoder.width(), 4);
        assert_eq!(encoder.encode(2).unwrap(), vec![0.0, 0.0, 1.0, 0.0]);
        assert!(encoder.encode(4).is_err());
    }

    #[test]
    fn test_one_hot_encoder_drop_last() {
        let encoder = OneHotEncoder::new("Carrier_index", "Carrier_vec", 3, true);
        assert_eq!(encoder.width(), 2);
        assert_eq!(encoder.encode(0).unwrap(), vec![1.0, 0.0]);
        // The dropped category encodes as all zeros.
        assert_eq!(encoder.encode(2).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_categorical_pipeline_round_trip() {
        let values = strings(&["WN", "DL", "WN"]);
        let pipeline = CategoricalPipeline::fit("Carrier", &values);
        let encoded = pipeline.transform(&values).unwrap();
        assert_eq!(encoded.len(), 3);
        assert!(encoded.iter().all(|v| v.len() == 2));
        assert_eq!(encoded[0], vec![1.0, 0.0]);
        assert_eq!(encoded[1], vec![0.0, 1.0]);
    }

    #[test]
    fn test_vector_assembler_concatenates_in_order() {
        let assembler = VectorAssembler::new(&["DepDelay", "Distance"], "NumericFeatures_vec");
        assert_eq!(
            assembler.assemble(&[&[14.0], &[368.0]]).unwrap(),
            vec![14.0, 368.0]
        );
        assert!(assembler.assemble(&[&[14.0]]).is_err());
    }
}
