use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::Config,
    error::AggregateError,
    http::build_client,
    model::{AggregateResult, ProviderReading},
    provider::{ProviderId, WeatherProvider, providers_from_config},
};

/// Fans a city lookup out to every configured provider and reduces whatever
/// comes back into one [`AggregateResult`].
#[derive(Debug, Clone)]
pub struct WeatherAggregator {
    providers: Vec<Arc<dyn WeatherProvider>>,
}

impl WeatherAggregator {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>) -> Self {
        Self { providers }
    }

    /// Build the shared HTTP client and every provider the config enables.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_client(&config.http)?;
        let providers = providers_from_config(config, http);

        info!(
            providers = ?providers.iter().map(|p| p.id().as_str()).collect::<Vec<_>>(),
            timeout_secs = config.http.timeout_secs,
            "weather aggregator ready"
        );

        Ok(Self::new(providers))
    }

    pub fn configured_providers(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    #[instrument(skip(self))]
    pub async fn aggregate(&self, city: &str) -> Result<AggregateResult, AggregateError> {
        // Only the empty string is missing; whitespace goes upstream as given.
        if city.is_empty() {
            return Err(AggregateError::MissingCity);
        }

        let readings = self.collect_readings(city).await;
        summarize(city, readings)
    }

    /// One task per provider; each sends at most one reading. The loop ends
    /// once every sender is dropped, i.e. every task has finished.
    async fn collect_readings(&self, city: &str) -> Vec<ProviderReading> {
        let (tx, mut rx) = mpsc::channel::<ProviderReading>(self.providers.len().max(1));

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let city = city.to_string();
            let tx = tx.clone();

            tokio::spawn(async move {
                let id = provider.id();
                match provider.current_reading(&city).await {
                    Ok(reading) => {
                        debug!(provider = %id, temp = reading.temp, "reading received");
                        // Receiver outlives every sender.
                        let _ = tx.send(reading).await;
                    }
                    Err(err) => {
                        warn!(provider = %id, city = %city, "provider dropped: {err:#}");
                    }
                }
            });
        }
        drop(tx);

        let mut readings = Vec::with_capacity(self.providers.len());
        while let Some(reading) = rx.recv().await {
            readings.push(reading);
        }
        readings
    }
}

/// Reduce readings to the response; an empty set is [`AggregateError::NoData`].
pub fn summarize(
    city: &str,
    readings: Vec<ProviderReading>,
) -> Result<AggregateResult, AggregateError> {
    if readings.is_empty() {
        warn!(city, "no weather data could be fetched");
        return Err(AggregateError::NoData);
    }

    let total: f64 = readings.iter().map(|r| r.temp).sum();
    let mean = total / readings.len() as f64;

    Ok(AggregateResult {
        city: city.to_string(),
        average_temp: round_to_hundredths(mean),
        sources: readings,
    })
}

/// Two decimals, ties rounded away from zero.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
