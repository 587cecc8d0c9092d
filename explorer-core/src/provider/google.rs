use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::Coordinates,
    provider::{ServiceId, join_url, send_and_read, truncate_body},
};

use super::Geocoder;

/// Google Maps Geocoding API client.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GoogleGeocoder {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: ServiceId::GoogleMaps.default_base_url().to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, location: &str) -> Result<Coordinates> {
        let url = join_url(&self.base_url, "/maps/api/geocode/json");

        let request = self
            .http
            .get(url)
            .query(&[("address", location), ("key", self.api_key.as_str())]);

        let (status, body) = send_and_read(request, "Google Geocoding").await?;

        if !status.is_success() {
            return Err(Error::InvalidLocation(format!(
                "geocoding request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: GeocodeResponse = serde_json::from_str(&body)
            .map_err(|e| Error::FetchFailed(format!("Failed to parse geocoding JSON: {e}")))?;

        if parsed.status != "OK" {
            let detail = parsed.error_message.map(|m| format!(" ({m})")).unwrap_or_default();
            return Err(Error::InvalidLocation(format!(
                "'{location}' could not be geocoded: {}{detail}",
                parsed.status
            )));
        }

        let first = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidLocation(format!("'{location}' returned no results")))?;

        let coordinates = Coordinates {
            latitude: first.geometry.location.lat,
            longitude: first.geometry.location.lng,
        };

        tracing::debug!(location, lat = coordinates.latitude, lng = coordinates.longitude, "geocoded");
        Ok(coordinates)
    }
}
