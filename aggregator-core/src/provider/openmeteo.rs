//! Open-Meteo needs no key but only answers for coordinates, so a reading
//! takes two sequential calls: geocoding, then the current-conditions forecast.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    http::get_json,
    model::{GeoCoordinate, ProviderReading},
    provider::{ProviderId, describe},
};

use super::WeatherProvider;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const CURRENT_FIELDS: &str = "temperature_2m,weather_code,wind_speed_10m";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    language: String,
    geocoding_endpoint: String,
    forecast_endpoint: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(http: Client, language: &str) -> Self {
        Self {
            language: language.to_string(),
            geocoding_endpoint: GEOCODING_URL.to_string(),
            forecast_endpoint: FORECAST_URL.to_string(),
            http,
        }
    }

    pub fn with_geocoding_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.geocoding_endpoint = endpoint.into();
        self
    }

    pub fn with_forecast_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.forecast_endpoint = endpoint.into();
        self
    }

    async fn geocode(&self, city: &str) -> Result<GeoCoordinate> {
        let parsed: GeocodingResponse = get_json(
            &self.http,
            &self.geocoding_endpoint,
            &[
                ("name", city),
                ("count", "1"),
                ("language", self.language.as_str()),
                ("format", "json"),
            ],
            "Open-Meteo geocoding",
        )
        .await?;

        parsed
            .results
            .first()
            .map(|r| GeoCoordinate {
                latitude: r.latitude,
                longitude: r.longitude,
            })
            .ok_or_else(|| anyhow!("Open-Meteo returned no geocoding results for '{city}'"))
    }

    async fn current_at(&self, coord: GeoCoordinate) -> Result<OmCurrent> {
        let (latitude, longitude) = coord.query_values();

        let parsed: ForecastResponse = get_json(
            &self.http,
            &self.forecast_endpoint,
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", CURRENT_FIELDS),
                ("timezone", "auto"),
            ],
            "Open-Meteo forecast",
        )
        .await?;

        Ok(parsed.current)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    // Absent entirely when nothing matches.
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: OmCurrent,
}

impl OmCurrent {
    fn into_reading(self) -> ProviderReading {
        let condition = describe_wmo_code(self.weather_code);

        ProviderReading {
            name: ProviderId::OpenMeteo.display_name().to_string(),
            temp: self.temperature_2m,
            description: describe(&condition, self.wind_speed_10m, "km/h"),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }

    #[instrument(skip(self), fields(provider = "openmeteo"))]
    async fn current_reading(&self, city: &str) -> Result<ProviderReading> {
        let coord = self.geocode(city).await?;
        debug!(
            latitude = coord.latitude,
            longitude = coord.longitude,
            "geocoded"
        );

        let current = self.current_at(coord).await?;
        Ok(current.into_reading())
    }
}

/// Russian phrase for a WMO weather interpretation code.
/// Unknown codes fall back to a string carrying the number.
pub fn describe_wmo_code(code: i32) -> String {
    let phrase = match code {
        0 => "Ясно",
        1 => "В основном ясно",
        2 => "Переменная облачность",
        3 => "Пасмурно",
        45 | 48 => "Туман",
        51 | 53 | 55 => "Морось",
        56 | 57 => "Ледяная морось",
        61 | 63 | 65 => "Дождь",
        66 | 67 => "Ледяной дождь",
        71 | 73 | 75 => "Снег",
        77 => "Снежные зерна",
        80..=82 => "Ливень",
        85 | 86 => "Снежный ливень",
        95 => "Гроза",
        96 | 99 => "Гроза с градом",
        _ => return format!("Код погоды: {code}"),
    };
    phrase.to_string()
}
