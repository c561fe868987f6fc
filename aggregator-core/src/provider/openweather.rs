use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    http::get_json,
    model::ProviderReading,
    provider::{ProviderId, describe},
};

use super::WeatherProvider;

const CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    language: String,
    endpoint: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, http: Client, language: &str) -> Self {
        Self {
            api_key,
            language: language.to_string(),
            endpoint: CURRENT_URL.to_string(),
            http,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
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
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_reading(self) -> ProviderReading {
        let condition = self
            .weather
            .first()
            .map(|w| w.description.as_str())
            .unwrap_or("N/A");

        ProviderReading {
            name: ProviderId::OpenWeather.display_name().to_string(),
            temp: self.main.temp,
            description: describe(condition, self.wind.speed, "m/s"),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    #[instrument(skip(self), fields(provider = "openweather"))]
    async fn current_reading(&self, city: &str) -> Result<ProviderReading> {
        let parsed: OwCurrentResponse = get_json(
            &self.http,
            &self.endpoint,
            &[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", self.language.as_str()),
            ],
            "OpenWeatherMap",
        )
        .await?;

        Ok(parsed.into_reading())
    }
}
