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

const CURRENT_URL: &str = "http://api.weatherapi.com/v1/current.json";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    language: String,
    endpoint: String,
    http: Client,
}

impl WeatherApiProvider {
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
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    wind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    current: WaCurrent,
}

impl WaResponse {
    fn into_reading(self) -> ProviderReading {
        ProviderReading {
            name: ProviderId::WeatherApi.display_name().to_string(),
            temp: self.current.temp_c,
            description: describe(&self.current.condition.text, self.current.wind_kph, "km/h"),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    #[instrument(skip(self), fields(provider = "weatherapi"))]
    async fn current_reading(&self, city: &str) -> Result<ProviderReading> {
        let parsed: WaResponse = get_json(
            &self.http,
            &self.endpoint,
            &[
                ("key", self.api_key.as_str()),
                ("q", city),
                ("lang", self.language.as_str()),
            ],
            "WeatherAPI.com",
        )
        .await?;

        Ok(parsed.into_reading())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_uses_celsius_and_kph() {
        let parsed: WaResponse = serde_json::from_str(
            r#"{
                "location": { "name": "Лондон", "country": "United Kingdom" },
                "current": {
                    "temp_c": 12.0,
                    "temp_f": 53.6,
                    "wind_kph": 14.76,
                    "condition": { "text": "Переменная облачность", "code": 1003 }
                }
            }"#,
        )
        .expect("valid payload");

        let reading = parsed.into_reading();
        assert_eq!(reading.name, "WeatherAPI.com");
        assert_eq!(reading.temp, 12.0);
        assert_eq!(
            reading.description,
            "Переменная облачность, ветер 14.8 km/h"
        );
    }

    #[test]
    fn missing_condition_is_a_decode_error() {
        let body = r#"{ "current": { "temp_c": 1.0, "wind_kph": 2.0 } }"#;
        let parsed = serde_json::from_str::<WaResponse>(body);
        assert!(parsed.is_err());
    }
}
