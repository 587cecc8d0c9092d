use std::{fmt, str::FromStr};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type RecordId = i64;

/// Date format used for `start_date`/`end_date` everywhere: input, storage and export.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One stored weather query together with its snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub id: RecordId,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub temperature: f64,
    pub weather_desc: String,
    pub request_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Temperature/description snapshot returned by a weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub temperature_c: f64,
    pub description: String,
}

/// Current weather for a free-text location, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub location: String,
    pub coordinates: Coordinates,
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    TemperatureAscending,
    TemperatureDescending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "newest",
            SortOrder::OldestFirst => "oldest",
            SortOrder::TemperatureAscending => "temp-asc",
            SortOrder::TemperatureDescending => "temp-desc",
        }
    }

    pub const fn all() -> &'static [SortOrder] {
        &[
            SortOrder::NewestFirst,
            SortOrder::OldestFirst,
            SortOrder::TemperatureAscending,
            SortOrder::TemperatureDescending,
        ]
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "newest" | "newest-first" => Ok(SortOrder::NewestFirst),
            "oldest" | "oldest-first" => Ok(SortOrder::OldestFirst),
            "temp-asc" | "temperature-ascending" => Ok(SortOrder::TemperatureAscending),
            "temp-desc" | "temperature-descending" => Ok(SortOrder::TemperatureDescending),
            _ => Err(Error::InvalidValue(format!(
                "Unknown sort order '{s}'. Supported: newest, oldest, temp-asc, temp-desc."
            ))),
        }
    }
}

/// Parameters of [`crate::RecordStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Case-insensitive substring matched against `location`.
    pub search: Option<String>,
    pub sort: SortOrder,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank search text is treated as no filter.
    pub fn search(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.search = if text.trim().is_empty() { None } else { Some(text) };
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Partial update of a record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub temperature: Option<f64>,
    pub description: Option<String>,
}

impl RecordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, value: f64) -> Self {
        self.temperature = Some(value);
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.description.is_none()
    }
}

/// Literal selection value meaning "do not restrict by location".
pub const ALL_LOCATIONS: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    Only(Vec<String>),
}

impl LocationFilter {
    /// Build a filter from a user selection; an empty selection or one containing
    /// the `All` sentinel disables the restriction.
    pub fn from_selection<I, S>(selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locations: Vec<String> = selection.into_iter().map(Into::into).collect();

        if locations.is_empty() || locations.iter().any(|l| l.eq_ignore_ascii_case(ALL_LOCATIONS)) {
            LocationFilter::All
        } else {
            LocationFilter::Only(locations)
        }
    }
}

/// Parameters of [`crate::RecordStore::export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFilter {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub locations: LocationFilter,
}

impl ExportFilter {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to, locations: LocationFilter::All }
    }

    /// `[today - days, today]`, all locations.
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let from = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self::new(from, today)
    }

    pub fn locations(mut self, locations: LocationFilter) -> Self {
        self.locations = locations;
        self
    }
}

/// Aggregates over the whole collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Stats {
    pub count: usize,
    pub most_frequent_location: Option<String>,
    pub average_temperature: Option<f64>,
}

/// Shortcut date ranges offered when creating a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePreset {
    Today,
    Next7Days,
    Next30Days,
}

impl DatePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Next7Days => "next7",
            DatePreset::Next30Days => "next30",
        }
    }

    /// Inclusive `(start, end)` range starting at `today`.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days = match self {
            DatePreset::Today => 0,
            DatePreset::Next7Days => 7,
            DatePreset::Next30Days => 30,
        };
        let end = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        (today, end)
    }
}

impl fmt::Display for DatePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatePreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "today" => Ok(DatePreset::Today),
            "next7" | "next-7-days" => Ok(DatePreset::Next7Days),
            "next30" | "next-30-days" => Ok(DatePreset::Next30Days),
            _ => Err(Error::InvalidValue(format!(
                "Unknown date preset '{s}'. Supported: today, next7, next30."
            ))),
        }
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| Error::InvalidDate(format!("'{input}' ({e})")))
}

/// Reject ranges whose start falls after their end.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start > end {
        return Err(Error::InvalidDate(format!(
            "start date {start} must not be after end date {end}"
        )));
    }
    Ok(())
}

/// Parse user-entered temperature text; only finite numbers are accepted.
pub fn parse_temperature(input: &str) -> Result<f64> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidValue(format!("Temperature must be a number, got '{input}'")))?;
    ensure_finite(value)
}

pub(crate) fn ensure_finite(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidValue(format!("Temperature must be a finite number, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn sort_order_as_str_roundtrip() {
        for sort in SortOrder::all() {
            let parsed: SortOrder = sort.as_str().parse().expect("roundtrip should succeed");
            assert_eq!(*sort, parsed);
        }
    }

    #[test]
    fn unknown_sort_order_is_invalid_value() {
        let err = "sideways".parse::<SortOrder>().unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        assert_eq!(parse_date("2024-03-01").expect("valid"), date(2024, 3, 1));
        assert!(matches!(parse_date("01/03/2024"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_date("2024-02-30"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_date(""), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(validate_range(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(validate_range(date(2024, 1, 1), date(2024, 1, 2)).is_ok());
        assert!(matches!(
            validate_range(date(2024, 1, 2), date(2024, 1, 1)),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn parse_temperature_accepts_zero_and_rejects_text() {
        assert_eq!(parse_temperature("0").expect("zero is a value"), 0.0);
        assert_eq!(parse_temperature(" -3.5 ").expect("negative"), -3.5);
        assert!(matches!(parse_temperature("warm"), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_temperature("NaN"), Err(Error::InvalidValue(_))));
        assert!(matches!(parse_temperature("inf"), Err(Error::InvalidValue(_))));
    }

    #[test]
    fn location_filter_all_sentinel() {
        assert_eq!(LocationFilter::from_selection(Vec::<String>::new()), LocationFilter::All);
        assert_eq!(LocationFilter::from_selection(["Paris", "All"]), LocationFilter::All);
        assert_eq!(
            LocationFilter::from_selection(["Paris", "Tokyo"]),
            LocationFilter::Only(vec!["Paris".to_string(), "Tokyo".to_string()])
        );
    }

    #[test]
    fn date_presets() {
        let today = date(2024, 12, 30);
        assert_eq!(DatePreset::Today.range(today), (today, today));
        assert_eq!(DatePreset::Next7Days.range(today), (today, date(2025, 1, 6)));
        assert_eq!(DatePreset::Next30Days.range(today), (today, date(2025, 1, 29)));
        assert_eq!("next7".parse::<DatePreset>().expect("known preset"), DatePreset::Next7Days);
    }

    #[test]
    fn export_filter_last_days() {
        let filter = ExportFilter::last_days(date(2024, 3, 31), 30);
        assert_eq!(filter.from, date(2024, 3, 1));
        assert_eq!(filter.to, date(2024, 3, 31));
        assert_eq!(filter.locations, LocationFilter::All);
    }

    #[test]
    fn blank_search_is_no_filter() {
        assert_eq!(ListQuery::new().search("   ").search, None);
        assert_eq!(ListQuery::new().search("Lon").search.as_deref(), Some("Lon"));
    }

    #[test]
    fn empty_update() {
        assert!(RecordUpdate::new().is_empty());
        assert!(!RecordUpdate::new().temperature(0.0).is_empty());
    }
}
