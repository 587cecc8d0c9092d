use crate::{
    Config,
    error::{Error, Result},
    model::{Conditions, Coordinates, Video},
    provider::{google::GoogleGeocoder, openweather::OpenWeatherProvider, youtube::YouTubeSearch},
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod google;
pub mod openweather;
pub mod youtube;

/// Upstream services that need an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceId {
    GoogleMaps,
    OpenWeather,
    YouTube,
}

impl ServiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::GoogleMaps => "google_maps",
            ServiceId::OpenWeather => "openweather",
            ServiceId::YouTube => "youtube",
        }
    }

    pub const fn all() -> &'static [ServiceId] {
        &[ServiceId::GoogleMaps, ServiceId::OpenWeather, ServiceId::YouTube]
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ServiceId::GoogleMaps => "https://maps.googleapis.com",
            ServiceId::OpenWeather => "https://api.openweathermap.org",
            ServiceId::YouTube => "https://www.googleapis.com",
        }
    }

    /// Environment variable that overrides the configured key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ServiceId::GoogleMaps => "GOOGLE_MAPS_API_KEY",
            ServiceId::OpenWeather => "OPENWEATHER_API_KEY",
            ServiceId::YouTube => "YOUTUBE_API_KEY",
        }
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ServiceId {
    type Error = Error;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "google_maps" | "google" | "geocoding" => Ok(ServiceId::GoogleMaps),
            "openweather" | "weather" => Ok(ServiceId::OpenWeather),
            "youtube" | "video" => Ok(ServiceId::YouTube),
            _ => Err(Error::InvalidValue(format!(
                "Unknown service '{value}'. Supported services: google_maps, openweather, youtube."
            ))),
        }
    }
}

impl std::str::FromStr for ServiceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ServiceId::try_from(s)
    }
}

/// Resolves free-text locations to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve(&self, location: &str) -> Result<Coordinates>;
}

/// Current conditions at a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_conditions(&self, coordinates: Coordinates) -> Result<Conditions>;
}

/// Weather-related videos for a location.
#[async_trait]
pub trait VideoSearch: Send + Sync + Debug {
    async fn search(&self, location: &str) -> Result<Vec<Video>>;
}

pub fn geocoder_from_config(config: &Config) -> Result<Box<dyn Geocoder>> {
    let id = ServiceId::GoogleMaps;
    let api_key = config.api_key(id)?;
    Ok(Box::new(GoogleGeocoder::new(api_key.to_owned()).with_base_url(config.base_url(id))))
}

pub fn weather_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>> {
    let id = ServiceId::OpenWeather;
    let api_key = config.api_key(id)?;
    Ok(Box::new(OpenWeatherProvider::new(api_key.to_owned()).with_base_url(config.base_url(id))))
}

pub fn video_search_from_config(config: &Config) -> Result<Box<dyn VideoSearch>> {
    let id = ServiceId::YouTube;
    let api_key = config.api_key(id)?;
    Ok(Box::new(YouTubeSearch::new(api_key.to_owned()).with_base_url(config.base_url(id))))
}

/// Send a request and read the full body, keeping the status for the caller.
pub(crate) async fn send_and_read(request: RequestBuilder, what: &str) -> Result<(StatusCode, String)> {
    let res = request
        .send()
        .await
        .map_err(|e| Error::FetchFailed(format!("Failed to send request to {what}: {e}")))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| Error::FetchFailed(format!("Failed to read {what} response body: {e}")))?;

    tracing::debug!(service = what, %status, "upstream response");
    Ok((status, body))
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn service_id_as_str_roundtrip() {
        for id in ServiceId::all() {
            let s = id.as_str();
            let parsed = ServiceId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn unknown_service_error() {
        let err = ServiceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown service"));
    }

    #[test]
    fn clients_error_when_missing_api_key() {
        let cfg = Config::default();

        let err = geocoder_from_config(&cfg).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ServiceId::GoogleMaps)));

        let err = weather_from_config(&cfg).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ServiceId::OpenWeather)));

        let err = video_search_from_config(&cfg).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(ServiceId::YouTube)));
    }

    #[test]
    fn clients_build_when_configured() {
        let mut cfg = Config::default();
        for id in ServiceId::all() {
            cfg.upsert_api_key(*id, "KEY".to_string());
        }

        assert!(geocoder_from_config(&cfg).is_ok());
        assert!(weather_from_config(&cfg).is_ok());
        assert!(video_search_from_config(&cfg).is_ok());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);

        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn join_url_trims_trailing_slash() {
        assert_eq!(join_url("http://localhost:1234/", "/a/b"), "http://localhost:1234/a/b");
        assert_eq!(join_url("http://localhost:1234", "/a/b"), "http://localhost:1234/a/b");
    }
}
