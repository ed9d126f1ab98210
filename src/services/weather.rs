//! `OpenWeatherMap` client for weather intents

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Measurement units for weather lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    /// Celsius, meters per second
    #[default]
    Metric,
    /// Fahrenheit, miles per hour
    Imperial,
}

impl Units {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
        }
    }
}

/// Current conditions for a location
#[derive(Debug, Clone, Serialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: u8,
    pub description: String,
    pub wind_speed: f64,
    pub location: String,
    pub country: String,
}

impl CurrentWeather {
    /// Spoken-reply summary of the conditions
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Current weather in {}, {}: {:.0} degrees, feels like {:.0}, {}, humidity {}%",
            self.location,
            self.country,
            self.temperature,
            self.feels_like,
            self.description,
            self.humidity
        )
    }
}

/// One forecast slot
#[derive(Debug, Clone, Serialize)]
pub struct ForecastEntry {
    pub datetime: String,
    pub temperature: f64,
    pub description: String,
    pub humidity: u8,
}

/// Short-range forecast for a location
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub location: String,
    pub country: String,
    pub entries: Vec<ForecastEntry>,
}

/// `OpenWeatherMap` API client
pub struct WeatherClient {
    client: Client,
    api_key: SecretString,
}

impl WeatherClient {
    /// Create a weather client
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Current weather for a city name or coordinates
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the response cannot be
    /// parsed.
    pub async fn current(&self, location: &str, units: Units) -> Result<CurrentWeather> {
        let raw: CurrentResponse = self.get("weather", location, units).await?;

        let description = raw
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .unwrap_or_default();

        Ok(CurrentWeather {
            temperature: raw.main.temp,
            feels_like: raw.main.feels_like,
            humidity: raw.main.humidity,
            description,
            wind_speed: raw.wind.speed,
            location: raw.name,
            country: raw.sys.country,
        })
    }

    /// Short-range forecast (next five slots) for a location
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the response cannot be
    /// parsed.
    pub async fn forecast(&self, location: &str, units: Units) -> Result<Forecast> {
        let raw: ForecastResponse = self.get("forecast", location, units).await?;

        let entries = raw
            .list
            .into_iter()
            .take(5)
            .map(|slot| ForecastEntry {
                datetime: slot.dt_txt,
                temperature: slot.main.temp,
                humidity: slot.main.humidity,
                description: slot
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| w.description)
                    .unwrap_or_default(),
            })
            .collect();

        Ok(Forecast {
            location: raw.city.name,
            country: raw.city.country,
            entries,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &str,
        units: Units,
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{BASE_URL}/{endpoint}"))
            .query(&[
                ("q", location),
                ("appid", self.api_key.expose_secret()),
                ("units", units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Weather(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Weather(format!("API error: {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Weather(format!("failed to parse response: {e}")))
    }
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    weather: Vec<WeatherBlock>,
    wind: WindBlock,
    name: String,
    sys: SysBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct WeatherBlock {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    city: CityBlock,
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct CityBlock {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    dt_txt: String,
    main: MainBlock,
    weather: Vec<WeatherBlock>,
}
