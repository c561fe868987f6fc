use crate::{
    Config, ProviderReading,
    provider::{
        openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider,
        weatherapi::WeatherApiProvider,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod openmeteo;
pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    WeatherApi,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenMeteo => "openmeteo",
        }
    }

    /// Name reported in [`ProviderReading::name`].
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "OpenWeatherMap",
            ProviderId::WeatherApi => "WeatherAPI.com",
            ProviderId::OpenMeteo => "Open-Meteo",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderId::OpenMeteo)
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::WeatherApi, ProviderId::OpenMeteo]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. \
                 Supported providers: openweather, weatherapi, openmeteo."
            )),
        }
    }
}

/// One upstream weather source.
///
/// Implementations report every failure as `Err`; deciding that a failure is
/// silent is up to the caller.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current_reading(&self, city: &str) -> anyhow::Result<ProviderReading>;
}

/// Wind part shared by every description, e.g. `"ясно, ветер 3.4 m/s"`.
pub(crate) fn describe(condition: &str, wind_speed: f64, unit: &str) -> String {
    format!("{condition}, ветер {wind_speed:.1} {unit}")
}

/// Build every provider that can be dispatched with `config`.
///
/// Key-based providers without a key are left out entirely.
pub fn providers_from_config(config: &Config, http: Client) -> Vec<Arc<dyn WeatherProvider>> {
    let language = config.http.language.as_str();
    let mut providers: Vec<Arc<dyn WeatherProvider>> = Vec::new();

    for &id in ProviderId::all() {
        let overrides = config.provider_config(id).cloned().unwrap_or_default();

        let api_key = if id.requires_api_key() {
            match config.provider_api_key(id) {
                Some(key) => key.to_owned(),
                None => {
                    tracing::warn!(
                        provider = %id,
                        "no API key configured, provider will be skipped"
                    );
                    continue;
                }
            }
        } else {
            String::new()
        };

        let provider: Arc<dyn WeatherProvider> = match id {
            ProviderId::OpenWeather => {
                let mut p = OpenWeatherProvider::new(api_key, http.clone(), language);
                if let Some(url) = overrides.endpoint {
                    p = p.with_endpoint(url);
                }
                Arc::new(p)
            }
            ProviderId::WeatherApi => {
                let mut p = WeatherApiProvider::new(api_key, http.clone(), language);
                if let Some(url) = overrides.endpoint {
                    p = p.with_endpoint(url);
                }
                Arc::new(p)
            }
            ProviderId::OpenMeteo => {
                let mut p = OpenMeteoProvider::new(http.clone(), language);
                if let Some(url) = overrides.geocoding_endpoint {
                    p = p.with_geocoding_endpoint(url);
                }
                if let Some(url) = overrides.endpoint {
                    p = p.with_forecast_endpoint(url);
                }
                Arc::new(p)
            }
        };

        providers.push(provider);
    }

    providers
}
