use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Error, Result},
    model::{Conditions, Coordinates},
    provider::{ServiceId, join_url, send_and_read, truncate_body},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: ServiceId::OpenWeather.default_base_url().to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    cod: Value,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    message: Option<String>,
}

/// OpenWeather reports `cod` as a number on success and sometimes as a string on errors.
fn cod_is_ok(cod: &Value) -> bool {
    match cod {
        Value::Number(n) => n.as_i64() == Some(200),
        Value::String(s) => s.trim() == "200",
        _ => false,
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_conditions(&self, coordinates: Coordinates) -> Result<Conditions> {
        let url = join_url(&self.base_url, "/data/2.5/weather");

        let request = self.http.get(url).query(&[
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);

        let (status, body) = send_and_read(request, "OpenWeather").await?;

        if !status.is_success() {
            return Err(Error::FetchFailed(format!(
                "OpenWeather request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| Error::FetchFailed(format!("Failed to parse OpenWeather JSON: {e}")))?;

        if !cod_is_ok(&parsed.cod) {
            return Err(Error::FetchFailed(format!(
                "OpenWeather returned cod {}: {}",
                parsed.cod,
                parsed.message.unwrap_or_default(),
            )));
        }

        let main = parsed
            .main
            .ok_or_else(|| Error::FetchFailed("OpenWeather response has no temperature".to_string()))?;

        let description = parsed
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| Error::FetchFailed("OpenWeather response has no weather description".to_string()))?;

        tracing::info!(
            lat = coordinates.latitude,
            lon = coordinates.longitude,
            temperature = main.temp,
            "fetched current weather"
        );

        Ok(Conditions { temperature_c: main.temp, description })
    }
}
