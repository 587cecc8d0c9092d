//! CSV and JSON serialization of weather records.

use std::{fmt, str::FromStr};

use chrono::SecondsFormat;
use serde::Serialize;

use crate::{
    error::{Error, Result},
    model::{DATE_FORMAT, RecordId, WeatherRecord},
};

pub const CSV_HEADER: [&str; 9] = [
    "ID",
    "Location",
    "Latitude",
    "Longitude",
    "Start Date",
    "End Date",
    "Temperature",
    "Description",
    "Request Time",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn default_file_name(&self) -> String {
        format!("weather_data_export.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(Error::InvalidValue(format!("Unknown export format '{s}'. Supported: csv, json."))),
        }
    }
}

/// One JSON export object; keys match the CSV column titles.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "ID")]
    id: RecordId,
    #[serde(rename = "Location")]
    location: &'a str,
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
    #[serde(rename = "Start Date")]
    start_date: String,
    #[serde(rename = "End Date")]
    end_date: String,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "Weather Description")]
    weather_desc: &'a str,
    #[serde(rename = "Request Time")]
    request_time: String,
}

impl<'a> From<&'a WeatherRecord> for ExportRow<'a> {
    fn from(record: &'a WeatherRecord) -> Self {
        Self {
            id: record.id,
            location: &record.location,
            latitude: record.latitude,
            longitude: record.longitude,
            start_date: record.start_date.format(DATE_FORMAT).to_string(),
            end_date: record.end_date.format(DATE_FORMAT).to_string(),
            temperature: record.temperature,
            weather_desc: &record.weather_desc,
            request_time: record.request_time.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Serialize records in order; no store or network access.
pub fn serialize(records: &[WeatherRecord], format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Json => {
            let rows: Vec<ExportRow<'_>> = records.iter().map(ExportRow::from).collect();
            Ok(serde_json::to_vec_pretty(&rows)?)
        }
    }
}

fn to_csv(records: &[WeatherRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for record in records {
        writer.write_record([
            record.id.to_string(),
            record.location.clone(),
            record.latitude.map(|v| v.to_string()).unwrap_or_default(),
            record.longitude.map(|v| v.to_string()).unwrap_or_default(),
            record.start_date.format(DATE_FORMAT).to_string(),
            record.end_date.format(DATE_FORMAT).to_string(),
            record.temperature.to_string(),
            record.weather_desc.clone(),
            record.request_time.to_rfc3339_opts(SecondsFormat::Micros, true),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Csv(csv::Error::from(e.into_error())))
}
