//! Geocode-then-fetch composition used by the dashboard and by record creation.

use crate::{
    Config,
    error::{Error, Result},
    model::Observation,
    provider::{Geocoder, WeatherProvider, geocoder_from_config, weather_from_config},
};

#[derive(Debug)]
pub struct WeatherLookup {
    geocoder: Box<dyn Geocoder>,
    weather: Box<dyn WeatherProvider>,
}

impl WeatherLookup {
    pub fn new(geocoder: Box<dyn Geocoder>, weather: Box<dyn WeatherProvider>) -> Self {
        Self { geocoder, weather }
    }

    /// Build both clients, failing with `MissingCredential` before any network I/O.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(geocoder_from_config(config)?, weather_from_config(config)?))
    }

    /// Current conditions for a free-text location.
    pub async fn current(&self, location: &str) -> Result<Observation> {
        let location = location.trim();
        if location.is_empty() {
            return Err(Error::InvalidLocation("location must not be empty".to_string()));
        }

        let coordinates = self.geocoder.resolve(location).await?;
        let conditions = self.weather.current_conditions(coordinates).await?;

        Ok(Observation { location: location.to_string(), coordinates, conditions })
    }
}
