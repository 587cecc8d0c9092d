use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use explorer_core::{
    Config, DatePreset, ExportFilter, ExportFormat, ListQuery, LocationFilter, RecordId, RecordStore,
    RecordUpdate, ServiceId, SortOrder, WeatherLookup, analysis::AnalysisReport, parse_date, parse_temperature,
    provider::video_search_from_config, serialize, store::RECENT_LIMIT,
};
use inquire::{Password, PasswordDisplayMode};

use crate::display;

/// Days covered by an export when `--from` is not given.
const DEFAULT_EXPORT_DAYS: u64 = 30;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-explorer", version, about = "Track and analyze weather for any location")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file; overrides the configured path.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key of a service: google_maps, openweather or youtube.
    Configure {
        service: ServiceId,
    },

    /// Show current weather for a location without storing it.
    Current {
        location: String,
    },

    /// Quick stats and the most recent locations.
    Dashboard,

    /// Fetch current weather for a location and save it with a date range.
    Create {
        location: String,

        /// Start date, YYYY-MM-DD (default: today).
        #[arg(long, conflicts_with = "preset")]
        start: Option<String>,

        /// End date, YYYY-MM-DD (default: seven days after today).
        #[arg(long, conflicts_with = "preset")]
        end: Option<String>,

        /// today, next7 or next30.
        #[arg(long)]
        preset: Option<DatePreset>,
    },

    /// List saved records.
    List {
        /// Case-insensitive text matched against the location.
        #[arg(long)]
        search: Option<String>,

        /// newest, oldest, temp-asc or temp-desc.
        #[arg(long, default_value = "newest")]
        sort: SortOrder,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show one record.
    Show {
        id: RecordId,
    },

    /// Change the temperature and/or description of a record.
    Update {
        id: RecordId,

        #[arg(long, allow_hyphen_values = true)]
        temperature: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a record.
    Delete {
        id: RecordId,
    },

    /// Temperature distribution, location and monthly trends.
    Analyze,

    /// Find weather videos for a location.
    Videos {
        location: String,
    },

    /// Export records whose start date falls in a range.
    Export {
        /// csv or json.
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// First start date included, YYYY-MM-DD (default: 30 days ago).
        #[arg(long)]
        from: Option<String>,

        /// Last start date included, YYYY-MM-DD (default: today).
        #[arg(long)]
        to: Option<String>,

        /// Restrict to these locations; repeatable. `All` disables the restriction.
        #[arg(long = "location")]
        locations: Vec<String>,

        /// Output file (default: weather_data_export.<format>).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Wrap a core error so the user-facing text is shown first.
fn user_facing(err: explorer_core::Error) -> anyhow::Error {
    let msg = err.user_message();
    anyhow::Error::new(err).context(msg)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open_store(config: &Config, db: Option<PathBuf>) -> anyhow::Result<RecordStore> {
    let path = match db {
        Some(path) => path,
        None => config.database_path()?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    tracing::debug!(path = %path.display(), "opening database");
    RecordStore::open(&path).map_err(user_facing)
}

/// Open the store, run `action` on it and close it again.
fn with_store<F>(config: &Config, db: Option<PathBuf>, action: F) -> anyhow::Result<()>
where
    F: FnOnce(&RecordStore) -> anyhow::Result<()>,
{
    let store = open_store(config, db)?;
    action(&store)?;
    store.close().map_err(user_facing)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { config: config_path, db, command } = self;

        let config_path = match config_path {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        tracing::debug!(path = %config_path.display(), "using config file");

        let load = || Config::load_from(&config_path);

        match command {
            Command::Configure { service } => configure(service, &config_path),
            Command::Current { location } => current(&load()?, &location).await,
            Command::Videos { location } => videos(&load()?, &location).await,
            Command::Create { location, start, end, preset } => {
                let (start, end) = create_range(start, end, preset, today());
                create(&load()?, db, &location, &start, &end).await
            }
            Command::Dashboard => with_store(&load()?, db, dashboard),
            Command::List { search, sort, limit } => {
                with_store(&load()?, db, |store| list(store, search, sort, limit))
            }
            Command::Show { id } => with_store(&load()?, db, |store| show(store, id)),
            Command::Update { id, temperature, description } => {
                with_store(&load()?, db, |store| update(store, id, temperature, description))
            }
            Command::Delete { id } => with_store(&load()?, db, |store| delete(store, id)),
            Command::Analyze => with_store(&load()?, db, analyze),
            Command::Export { format, from, to, locations, output } => {
                let filter = export_filter(from, to, locations, today())?;
                with_store(&load()?, db, |store| export(store, &filter, format, output))
            }
        }
    }
}

async fn current(config: &Config, location: &str) -> anyhow::Result<()> {
    let lookup = WeatherLookup::from_config(config).map_err(user_facing)?;
    let observation = lookup.current(location).await.map_err(user_facing)?;
    display::print_observation(&observation);
    Ok(())
}

async fn videos(config: &Config, location: &str) -> anyhow::Result<()> {
    let search = video_search_from_config(config).map_err(user_facing)?;
    let videos = search.search(location).await.map_err(user_facing)?;
    display::print_videos(location, &videos);
    Ok(())
}

async fn create(
    config: &Config,
    db: Option<PathBuf>,
    location: &str,
    start: &str,
    end: &str,
) -> anyhow::Result<()> {
    let lookup = WeatherLookup::from_config(config).map_err(user_facing)?;

    let store = open_store(config, db)?;
    let id = store.create(&lookup, location, start, end).await.map_err(user_facing)?;
    store.close().map_err(user_facing)?;

    println!("Weather request for {location} saved with ID {id}.");
    Ok(())
}

fn dashboard(store: &RecordStore) -> anyhow::Result<()> {
    let stats = store.stats().map_err(user_facing)?;
    let recent = store.recent(RECENT_LIMIT).map_err(user_facing)?;
    display::print_dashboard(&stats, &recent);
    Ok(())
}

fn list(store: &RecordStore, search: Option<String>, sort: SortOrder, limit: usize) -> anyhow::Result<()> {
    let mut query = ListQuery::new().sort(sort).limit(limit);
    if let Some(search) = search {
        query = query.search(search);
    }
    let records = store.list(&query).map_err(user_facing)?;
    display::print_records(&records);
    Ok(())
}

fn show(store: &RecordStore, id: RecordId) -> anyhow::Result<()> {
    match store.get(id).map_err(user_facing)? {
        Some(record) => {
            display::print_record(&record);
            Ok(())
        }
        None => Err(user_facing(explorer_core::Error::NotFound(id))),
    }
}

fn update(
    store: &RecordStore,
    id: RecordId,
    temperature: Option<String>,
    description: Option<String>,
) -> anyhow::Result<()> {
    let mut update = RecordUpdate::new();
    if let Some(text) = temperature {
        update = update.temperature(parse_temperature(&text).map_err(user_facing)?);
    }
    if let Some(desc) = description.filter(|d| !d.trim().is_empty()) {
        update = update.description(desc);
    }
    store.update(id, &update).map_err(user_facing)?;
    println!("Record ID {id} updated successfully!");
    Ok(())
}

fn delete(store: &RecordStore, id: RecordId) -> anyhow::Result<()> {
    store.delete(id).map_err(user_facing)?;
    println!("Record ID {id} deleted successfully!");
    Ok(())
}

fn analyze(store: &RecordStore) -> anyhow::Result<()> {
    let records = store.all().map_err(user_facing)?;
    let report = AnalysisReport::from_records(&records).map_err(user_facing)?;
    display::print_analysis(report.as_ref());
    Ok(())
}

fn export(
    store: &RecordStore,
    filter: &ExportFilter,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let records = store.export(filter).map_err(user_facing)?;
    if records.is_empty() {
        println!("No data found for the selected filters.");
        if matches!(filter.locations, LocationFilter::Only(_)) {
            let known = store.distinct_locations().map_err(user_facing)?;
            if !known.is_empty() {
                println!("Stored locations: {}", known.join(", "));
            }
        }
        return Ok(());
    }

    let bytes = serialize(&records, format).map_err(user_facing)?;
    let output = output.unwrap_or_else(|| PathBuf::from(format.default_file_name()));
    fs::write(&output, bytes)
        .with_context(|| format!("Failed to write export file: {}", output.display()))?;

    println!("Exported {} records to {}", records.len(), output.display());
    Ok(())
}

fn configure(service: ServiceId, config_path: &Path) -> anyhow::Result<()> {
    let mut config = Config::load_file(config_path)?;
    if config.is_configured(service) {
        println!("A key for {service} is already stored; entering a new one replaces it.");
    }

    let api_key = Password::new(&format!("API key for {service}:"))
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.upsert_api_key(service, api_key.trim().to_string());
    config.save_to(config_path)?;

    println!("Saved API key for {service} to {}", config_path.display());
    Ok(())
}

/// Dates passed to `create`: an explicit preset wins, otherwise each missing
/// bound falls back to the next-7-days range.
fn create_range(
    start: Option<String>,
    end: Option<String>,
    preset: Option<DatePreset>,
    today: NaiveDate,
) -> (String, String) {
    if let Some(preset) = preset {
        let (start, end) = preset.range(today);
        return (start.to_string(), end.to_string());
    }

    let (default_start, default_end) = DatePreset::Next7Days.range(today);
    (
        start.unwrap_or_else(|| default_start.to_string()),
        end.unwrap_or_else(|| default_end.to_string()),
    )
}

fn export_filter(
    from: Option<String>,
    to: Option<String>,
    locations: Vec<String>,
    today: NaiveDate,
) -> anyhow::Result<ExportFilter> {
    let defaults = ExportFilter::last_days(today, DEFAULT_EXPORT_DAYS);

    let from = match from {
        Some(text) => parse_date(&text).map_err(user_facing)?,
        None => defaults.from,
    };
    let to = match to {
        Some(text) => parse_date(&text).map_err(user_facing)?,
        None => defaults.to,
    };

    Ok(ExportFilter::new(from, to).locations(LocationFilter::from_selection(locations)))
}
