pub mod env;
pub mod instantiate_run;
pub mod progress_bars;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub async fn get_memory_usage() -> u64 {
    use sysinfo::System;
    let mut sys = System::new_all();
    sys.refresh_memory();
    sys.used_memory() / (1024 * 1024) // Convert to MB
}

/// Read a newline-delimited JSON file into records, skipping blank lines.
pub fn read_ndjson<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line =
            line.with_context(|| format!("Failed to read line {} of {}", line_no + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(&line).with_context(|| {
            format!("Malformed JSON on line {} of {}", line_no + 1, path.display())
        })?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_ndjson_skips_blank_lines() {
        let path = std::env::temp_dir().join(format!("ndjson_test_{}.json", uuid::Uuid::new_v4()));
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"Manufacturer":"BOEING"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"Manufacturer":"AIRBUS"}}"#).unwrap();
        drop(file);

        let records: Vec<crate::models::core::Airplane> = read_ndjson(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].manufacturer.as_deref(), Some("BOEING"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_ndjson_reports_malformed_line() {
        let path = std::env::temp_dir().join(format!("ndjson_test_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json\n").unwrap();
        let result: Result<Vec<crate::models::core::Airplane>> = read_ndjson(&path);
        assert!(result.is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
