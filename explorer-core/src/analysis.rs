//! Descriptive statistics over stored records, backing the analysis view.
//!
//! Records are loaded into a polars `DataFrame` with one row per record and
//! the columns `location`, `temperature` and `month` (0 = January).

use chrono::Datelike;
use polars::prelude::*;
use serde::Serialize;

use crate::{error::Result, model::WeatherRecord};

pub const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// Number of locations shown in the "top locations" chart.
pub const TOP_LOCATIONS: usize = 10;

const LOCATION: &str = "location";
const TEMPERATURE: &str = "temperature";
const MONTH: &str = "month";
const COUNT: &str = "count";
const AVERAGE: &str = "average";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl TemperatureSummary {
    /// `None` when there are no records.
    pub fn from_records(records: &[WeatherRecord]) -> Result<Option<Self>> {
        if records.is_empty() {
            return Ok(None);
        }

        let temperature = col(TEMPERATURE);
        let out = frame(records)?
            .lazy()
            .select([
                temperature.clone().min().alias("min"),
                temperature.clone().max().alias("max"),
                temperature.clone().mean().alias("mean"),
                temperature.median().alias("median"),
            ])
            .collect()?;

        let scalar = |name: &str| -> Result<f64> { Ok(out.column(name)?.f64()?.get(0).unwrap_or(f64::NAN)) };

        Ok(Some(Self { min: scalar("min")?, max: scalar("max")?, mean: scalar("mean")?, median: scalar("median")? }))
    }
}

/// Everything the analysis view shows, computed in one pass over the records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub record_count: usize,
    pub summary: TemperatureSummary,
    pub distribution: Vec<(f64, usize)>,
    pub top_locations: Vec<(String, usize)>,
    pub by_location: Vec<(String, f64)>,
    pub monthly: [(&'static str, f64); 12],
}

impl AnalysisReport {
    /// `None` when there are no records.
    pub fn from_records(records: &[WeatherRecord]) -> Result<Option<Self>> {
        let Some(summary) = TemperatureSummary::from_records(records)? else {
            return Ok(None);
        };

        Ok(Some(Self {
            record_count: records.len(),
            summary,
            distribution: temperature_distribution(records)?,
            top_locations: location_counts(records, TOP_LOCATIONS)?,
            by_location: average_by_location(records)?,
            monthly: monthly_averages(records)?,
        }))
    }
}

fn frame(records: &[WeatherRecord]) -> PolarsResult<DataFrame> {
    let locations: Vec<&str> = records.iter().map(|r| r.location.as_str()).collect();
    let temperatures: Vec<f64> = records.iter().map(|r| r.temperature).collect();
    let months: Vec<u32> = records.iter().map(|r| r.start_date.month0()).collect();

    df!(
        LOCATION => locations,
        TEMPERATURE => temperatures,
        MONTH => months
    )
}

fn count_expr() -> Expr {
    len().cast(DataType::UInt64).alias(COUNT)
}

fn counts<'a>(out: &'a DataFrame, key: &str) -> Result<Vec<(Option<f64>, Option<&'a str>, usize)>> {
    let n = out.column(COUNT)?.u64()?;
    let key = out.column(key)?;
    let numbers = key.f64().ok();
    let names = key.str().ok();

    Ok((0..out.height())
        .map(|i| {
            let count = usize::try_from(n.get(i).unwrap_or(0)).unwrap_or(usize::MAX);
            (numbers.and_then(|c| c.get(i)), names.and_then(|c| c.get(i)), count)
        })
        .collect())
}

/// Count of records per distinct temperature, ascending by temperature.
pub fn temperature_distribution(records: &[WeatherRecord]) -> Result<Vec<(f64, usize)>> {
    let out = frame(records)?
        .lazy()
        .group_by([col(TEMPERATURE)])
        .agg([count_expr()])
        .sort([TEMPERATURE], SortMultipleOptions::default())
        .collect()?;

    Ok(counts(&out, TEMPERATURE)?
        .into_iter()
        .filter_map(|(temp, _, n)| temp.map(|t| (t, n)))
        .collect())
}

/// Most frequent locations first (ties by name), at most `top` entries.
pub fn location_counts(records: &[WeatherRecord], top: usize) -> Result<Vec<(String, usize)>> {
    let out = frame(records)?
        .lazy()
        .group_by([col(LOCATION)])
        .agg([count_expr()])
        .sort([COUNT, LOCATION], SortMultipleOptions::default().with_order_descending_multi([true, false]))
        .limit(IdxSize::try_from(top).unwrap_or(IdxSize::MAX))
        .collect()?;

    Ok(counts(&out, LOCATION)?
        .into_iter()
        .filter_map(|(_, name, n)| name.map(|l| (l.to_string(), n)))
        .collect())
}

fn averages<'a>(out: &'a DataFrame, key: &str) -> Result<Vec<(Option<&'a str>, Option<u32>, f64)>> {
    let avg = out.column(AVERAGE)?.f64()?;
    let key = out.column(key)?;
    let names = key.str().ok();
    let months = key.u32().ok();

    Ok((0..out.height())
        .filter_map(|i| {
            avg.get(i).map(|a| (names.and_then(|c| c.get(i)), months.and_then(|c| c.get(i)), a))
        })
        .collect())
}

/// Mean temperature per location, warmest first.
pub fn average_by_location(records: &[WeatherRecord]) -> Result<Vec<(String, f64)>> {
    let out = frame(records)?
        .lazy()
        .group_by([col(LOCATION)])
        .agg([col(TEMPERATURE).mean().alias(AVERAGE)])
        .sort([AVERAGE, LOCATION], SortMultipleOptions::default().with_order_descending_multi([true, false]))
        .collect()?;

    Ok(averages(&out, LOCATION)?
        .into_iter()
        .filter_map(|(name, _, avg)| name.map(|l| (l.to_string(), avg)))
        .collect())
}

/// Mean temperature per calendar month of `start_date`, Jan..Dec; empty months are 0.0.
pub fn monthly_averages(records: &[WeatherRecord]) -> Result<[(&'static str, f64); 12]> {
    let out = frame(records)?
        .lazy()
        .group_by([col(MONTH)])
        .agg([col(TEMPERATURE).mean().alias(AVERAGE)])
        .collect()?;

    let mut monthly = MONTHS.map(|m| (m, 0.0));
    for (_, month, avg) in averages(&out, MONTH)? {
        if let Some(slot) = month.and_then(|m| monthly.get_mut(m as usize)) {
            slot.1 = avg;
        }
    }
    Ok(monthly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn record(location: &str, temperature: f64, month: u32) -> WeatherRecord {
        let day = NaiveDate::from_ymd_opt(2024, month, 1).expect("valid date");
        WeatherRecord {
            id: 0,
            location: location.to_string(),
            latitude: None,
            longitude: None,
            start_date: day,
            end_date: day,
            temperature,
            weather_desc: "clear sky".to_string(),
            request_time: Utc::now(),
        }
    }

    fn sample() -> Vec<WeatherRecord> {
        vec![
            record("Paris", 18.0, 5),
            record("Tokyo", 25.0, 5),
            record("Paris", 10.0, 1),
            record("Oslo", -4.0, 1),
            record("Tokyo", 25.0, 8),
        ]
    }

    #[test]
    fn summary_of_odd_and_even_counts() {
        let summary = TemperatureSummary::from_records(&sample()).unwrap().expect("non-empty");
        assert_eq!(summary.min, -4.0);
        assert_eq!(summary.max, 25.0);
        assert_eq!(summary.mean, 14.8);
        assert_eq!(summary.median, 18.0);

        let pair = [record("Paris", 18.0, 5), record("Tokyo", 25.0, 5)];
        let summary = TemperatureSummary::from_records(&pair).unwrap().expect("non-empty");
        assert_eq!(summary.mean, 21.5);
        assert_eq!(summary.median, 21.5);

        assert!(TemperatureSummary::from_records(&[]).unwrap().is_none());
    }

    #[test]
    fn distribution_groups_equal_temperatures() {
        let dist = temperature_distribution(&sample()).unwrap();
        assert_eq!(dist, vec![(-4.0, 1), (10.0, 1), (18.0, 1), (25.0, 2)]);
    }

    #[test]
    fn location_counts_sorted_and_capped() {
        let counts = location_counts(&sample(), 2).unwrap();
        assert_eq!(counts, vec![("Paris".to_string(), 2), ("Tokyo".to_string(), 2)]);

        let all = location_counts(&sample(), TOP_LOCATIONS).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2], ("Oslo".to_string(), 1));
    }

    #[test]
    fn averages_warmest_first() {
        let avgs = average_by_location(&sample()).unwrap();
        assert_eq!(
            avgs,
            vec![("Tokyo".to_string(), 25.0), ("Paris".to_string(), 14.0), ("Oslo".to_string(), -4.0)]
        );
    }

    #[test]
    fn monthly_fills_missing_months_with_zero() {
        let monthly = monthly_averages(&sample()).unwrap();
        assert_eq!(monthly[0], ("Jan", 3.0));
        assert_eq!(monthly[4], ("May", 21.5));
        assert_eq!(monthly[7], ("Aug", 25.0));
        assert_eq!(monthly[11], ("Dec", 0.0));
    }

    #[test]
    fn report_bundles_every_view() {
        let report = AnalysisReport::from_records(&sample()).unwrap().expect("non-empty");
        assert_eq!(report.record_count, 5);
        assert_eq!(report.summary.median, 18.0);
        assert_eq!(report.top_locations.len(), 3);
        assert_eq!(report.by_location[0], ("Tokyo".to_string(), 25.0));
        assert_eq!(report.monthly[0], ("Jan", 3.0));

        assert!(AnalysisReport::from_records(&[]).unwrap().is_none());
    }

    #[test]
    fn empty_input_gives_empty_views() {
        assert!(temperature_distribution(&[]).unwrap().is_empty());
        assert!(location_counts(&[], TOP_LOCATIONS).unwrap().is_empty());
        assert!(average_by_location(&[]).unwrap().is_empty());
        assert!(monthly_averages(&[]).unwrap().iter().all(|(_, avg)| *avg == 0.0));
    }
}
