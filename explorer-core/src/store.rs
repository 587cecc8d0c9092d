//! SQLite-backed storage of weather records.
//!
//! `RecordStore` owns the single connection of the process. Every dynamic
//! query goes through [`SelectQuery`] so user input is always bound.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter, types::Type, types::Value};
use std::path::Path;

use crate::{
    error::{Error, Result},
    lookup::WeatherLookup,
    model::{
        DATE_FORMAT, ExportFilter, ListQuery, LocationFilter, Observation, RecordId, RecordUpdate,
        SortOrder, Stats, WeatherRecord, ensure_finite, parse_date, validate_range,
    },
    query::{SelectQuery, like_contains},
};

const TABLE: &str = "weather_requests";
const COLUMNS: &str =
    "id, location, latitude, longitude, start_date, end_date, temperature, weather_desc, request_time";

/// Number of rows shown in the "recent locations" panel.
pub const RECENT_LIMIT: usize = 5;

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open (or create) the database at `path` and make sure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self { conn };
        store.init_schema()?;
        tracing::debug!(path = %path.as_ref().display(), "opened record store");
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Close the connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Storage(e))
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                temperature REAL NOT NULL,
                weather_desc TEXT NOT NULL,
                request_time TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_weather_requests_start_date ON weather_requests(start_date);
            "#,
        )?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<WeatherRecord> {
        let start_date: String = row.get(4)?;
        let end_date: String = row.get(5)?;
        let request_time: String = row.get(8)?;

        Ok(WeatherRecord {
            id: row.get(0)?,
            location: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            start_date: parse_stored_date(4, &start_date)?,
            end_date: parse_stored_date(5, &end_date)?,
            temperature: row.get(6)?,
            weather_desc: row.get(7)?,
            request_time: DateTime::parse_from_rfc3339(&request_time)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?,
        })
    }

    fn select(&self, query: SelectQuery) -> Result<Vec<WeatherRecord>> {
        let (sql, params) = query.build();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), Self::row_to_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Validate input, fetch a snapshot and persist it. Nothing is written unless
    /// both upstream calls succeed.
    pub async fn create(
        &self,
        lookup: &WeatherLookup,
        location: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<RecordId> {
        if location.trim().is_empty() {
            return Err(Error::InvalidLocation("location must not be empty".to_string()));
        }

        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        validate_range(start, end)?;

        let observation = lookup.current(location).await.map_err(|err| match err {
            Error::InvalidLocation(msg) | Error::FetchFailed(msg) => {
                tracing::warn!(location, error = %msg, "weather lookup failed, nothing stored");
                Error::FetchFailed(msg)
            }
            other => other,
        })?;

        self.insert(location, &observation, start, end)
    }

    fn insert(
        &self,
        location: &str,
        observation: &Observation,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RecordId> {
        let request_time = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        self.conn.execute(
            r#"
            INSERT INTO weather_requests (location, latitude, longitude, start_date, end_date, temperature, weather_desc, request_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                location,
                observation.coordinates.latitude,
                observation.coordinates.longitude,
                start.format(DATE_FORMAT).to_string(),
                end.format(DATE_FORMAT).to_string(),
                observation.conditions.temperature_c,
                observation.conditions.description,
                request_time,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Created weather record with ID: {}", id);
        Ok(id)
    }

    pub fn list(&self, query: &ListQuery) -> Result<Vec<WeatherRecord>> {
        let mut select = SelectQuery::new(COLUMNS, TABLE);

        if let Some(search) = &query.search {
            select = select.filter("location LIKE ? ESCAPE '\\'", [Value::Text(like_contains(search))]);
        }

        self.select(select.order_by(order_clause(query.sort)).limit(query.limit))
    }

    /// Newest records first.
    pub fn recent(&self, limit: usize) -> Result<Vec<WeatherRecord>> {
        self.list(&ListQuery::new().sort(SortOrder::NewestFirst).limit(limit))
    }

    /// Every record in id order.
    pub fn all(&self) -> Result<Vec<WeatherRecord>> {
        self.select(SelectQuery::new(COLUMNS, TABLE).order_by("id ASC"))
    }

    pub fn get(&self, id: RecordId) -> Result<Option<WeatherRecord>> {
        let sql = format!("SELECT {COLUMNS} FROM {TABLE} WHERE id = ?1");
        Ok(self.conn.query_row(&sql, params![id], Self::row_to_record).optional()?)
    }

    fn exists(&self, id: RecordId) -> Result<bool> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM weather_requests WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?)
    }

    /// Apply the supplied fields only. A missing id is reported before the
    /// values are checked, and an empty update still checks that the record exists.
    pub fn update(&self, id: RecordId, update: &RecordUpdate) -> Result<()> {
        if !self.exists(id)? {
            return Err(Error::NotFound(id));
        }

        if let Some(temperature) = update.temperature {
            ensure_finite(temperature)?;
        }

        let changed = self.conn.execute(
            r#"
            UPDATE weather_requests
            SET temperature = COALESCE(?1, temperature), weather_desc = COALESCE(?2, weather_desc)
            WHERE id = ?3
            "#,
            params![update.temperature, update.description, id],
        )?;

        if changed == 0 {
            return Err(Error::NotFound(id));
        }

        tracing::debug!("Updated weather record: {}", id);
        Ok(())
    }

    pub fn delete(&self, id: RecordId) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM weather_requests WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(Error::NotFound(id));
        }

        tracing::debug!("Deleted weather record: {}", id);
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM weather_requests", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn stats(&self) -> Result<Stats> {
        let count = self.count()?;

        let most_frequent_location: Option<String> = self
            .conn
            .query_row(
                "SELECT location FROM weather_requests GROUP BY location ORDER BY COUNT(*) DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let average_temperature: Option<f64> =
            self.conn.query_row("SELECT AVG(temperature) FROM weather_requests", [], |row| row.get(0))?;

        Ok(Stats { count, most_frequent_location, average_temperature })
    }

    /// Records whose `start_date` lies in `[from, to]`, optionally limited to some locations.
    pub fn export(&self, filter: &ExportFilter) -> Result<Vec<WeatherRecord>> {
        validate_range(filter.from, filter.to)?;

        let mut select = SelectQuery::new(COLUMNS, TABLE).filter(
            "start_date >= ? AND start_date <= ?",
            [
                Value::Text(filter.from.format(DATE_FORMAT).to_string()),
                Value::Text(filter.to.format(DATE_FORMAT).to_string()),
            ],
        );

        if let LocationFilter::Only(locations) = &filter.locations {
            select = select.filter_in("location", locations.iter().cloned().map(Value::Text));
        }

        self.select(select.order_by("id ASC"))
    }

    pub fn distinct_locations(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT location FROM weather_requests ORDER BY location")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::NewestFirst => "request_time DESC, id DESC",
        SortOrder::OldestFirst => "request_time ASC, id ASC",
        SortOrder::TemperatureAscending => "temperature ASC, id ASC",
        SortOrder::TemperatureDescending => "temperature DESC, id DESC",
    }
}

fn parse_stored_date(column: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
