//! Core library for the weather aggregator.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The shared outbound HTTP client
//! - Adapters for each upstream weather provider
//! - The fan-out coordinator and the aggregation of readings
//!
//! It is used by the `weather-aggregator` binary, which exposes it over HTTP.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;

pub use aggregate::{WeatherAggregator, round_to_hundredths, summarize};
pub use config::{Config, HttpConfig, ProviderConfig, ServerConfig};
pub use error::AggregateError;
pub use model::{AggregateResult, ErrorBody, GeoCoordinate, ProviderReading};
pub use provider::{ProviderId, WeatherProvider};
