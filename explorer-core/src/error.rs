//! Error taxonomy shared by every core operation.

use thiserror::Error;

use crate::{model::RecordId, provider::ServiceId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Failed to fetch data: {0}")]
    FetchFailed(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("No API key configured for service '{0}'")]
    MissingCredential(ServiceId),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analysis error: {0}")]
    Analysis(#[from] polars::prelude::PolarsError),
}

impl Error {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidLocation(msg) => format!("Invalid location or unable to geocode: {msg}"),
            Self::FetchFailed(msg) => format!("Couldn't fetch weather data: {msg}"),
            Self::InvalidDate(msg) => format!("Invalid date: {msg}. Use YYYY-MM-DD."),
            Self::NotFound(id) => format!("Record {id} not found."),
            Self::InvalidValue(msg) => msg.clone(),
            Self::MissingCredential(id) => format!(
                "No API key configured for '{id}'.\n\
                 Hint: run `weather-explorer configure {id}` and enter your API key."
            ),
            Self::Storage(_) => "Local database error".to_string(),
            Self::Csv(_) | Self::Json(_) => "Failed to serialize export data".to_string(),
            Self::Analysis(_) => "Failed to analyze weather records".to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::FetchFailed(err.to_string())
    }
}
