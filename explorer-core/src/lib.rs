//! Core library for the `weather-explorer` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the geocoding, weather and video search APIs
//! - The SQLite record store with its filter/sort/export queries
//! - CSV/JSON export and descriptive analysis of stored records
//!
//! It is used by `explorer-cli`, but can also be reused by other binaries or services.

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod lookup;
pub mod model;
pub mod provider;
mod query;
pub mod store;

pub use config::{Config, ServiceConfig};
pub use error::{Error, Result};
pub use export::{ExportFormat, serialize};
pub use lookup::WeatherLookup;
pub use model::{
    Conditions, Coordinates, DatePreset, ExportFilter, ListQuery, LocationFilter, Observation, RecordId,
    RecordUpdate, SortOrder, Stats, Video, WeatherRecord, parse_date, parse_temperature,
};
pub use provider::{Geocoder, ServiceId, VideoSearch, WeatherProvider};
pub use store::RecordStore;
