// src/models/core.rs - Input record schemas for the two pipelines

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One airplane registry record from `airplanes.json`, one JSON object per
/// line. Every field is nullable in the source data; the deduplication
/// pipeline only requires `Manufacturer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Airplane {
    pub tail_num: Option<String>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub manufacturer_year: Option<String>,
    pub model: Option<String>,
    pub owner: Option<String>,
    pub owner_state: Option<String>,
    pub engine_manufacturer: Option<String>,
    pub engine_model: Option<String>,
}

/// One flight delay feature record from `simple_flight_delay_features.json`.
///
/// ```json
/// {
///   "ArrDelay":5.0,"CRSArrTime":"2015-12-31T03:20:00.000-08:00",
///   "CRSDepTime":"2015-12-31T03:05:00.000-08:00","Carrier":"WN",
///   "DayOfMonth":31,"DayOfWeek":4,"DayOfYear":365,"DepDelay":14.0,
///   "Dest":"SAN","Distance":368.0,"FlightDate":"2015-12-30T16:00:00.000-08:00",
///   "FlightNum":"6109","Origin":"TUS"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FlightDelayFeature {
    pub arr_delay: Option<f64>,
    #[serde(rename = "CRSArrTime")]
    pub crs_arr_time: Option<DateTime<FixedOffset>>,
    #[serde(rename = "CRSDepTime")]
    pub crs_dep_time: Option<DateTime<FixedOffset>>,
    pub carrier: Option<String>,
    pub day_of_month: Option<i32>,
    pub day_of_week: Option<i32>,
    pub day_of_year: Option<i32>,
    pub dep_delay: Option<f64>,
    pub dest: Option<String>,
    pub distance: Option<f64>,
    pub flight_date: Option<DateTime<FixedOffset>>,
    pub flight_num: Option<String>,
    pub origin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airplane_deserializes_with_missing_fields() {
        let record: Airplane =
            serde_json::from_str(r#"{"TailNum":"N12345","Manufacturer":"BOEING"}"#).unwrap();
        assert_eq!(record.tail_num.as_deref(), Some("N12345"));
        assert_eq!(record.manufacturer.as_deref(), Some("BOEING"));
        assert!(record.model.is_none());
    }

    #[test]
    fn test_flight_delay_feature_deserializes_full_record() {
        let json = r#"{
            "ArrDelay":5.0,"CRSArrTime":"2015-12-31T03:20:00.000-08:00",
            "CRSDepTime":"2015-12-31T03:05:00.000-08:00","Carrier":"WN",
            "DayOfMonth":31,"DayOfWeek":4,"DayOfYear":365,"DepDelay":14.0,
            "Dest":"SAN","Distance":368.0,
            "FlightDate":"2015-12-30T16:00:00.000-08:00",
            "FlightNum":"6109","Origin":"TUS"
        }"#;
        let record: FlightDelayFeature = serde_json::from_str(json).unwrap();
        assert_eq!(record.arr_delay, Some(5.0));
        assert_eq!(record.carrier.as_deref(), Some("WN"));
        assert_eq!(record.day_of_year, Some(365));
        assert_eq!(record.flight_num.as_deref(), Some("6109"));
        assert!(record.crs_arr_time.is_some());
    }

    #[test]
    fn test_flight_delay_feature_nulls_become_none() {
        let record: FlightDelayFeature =
            serde_json::from_str(r#"{"ArrDelay":null,"Carrier":"AA"}"#).unwrap();
        assert!(record.arr_delay.is_none());
        assert_eq!(record.carrier.as_deref(), Some("AA"));
    }
}
