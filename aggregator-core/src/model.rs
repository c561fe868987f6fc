use serde::{Deserialize, Serialize};

/// One provider's normalized reading for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReading {
    pub name: String,
    pub temp: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub city: String,
    #[serde(rename = "averageTemp")]
    pub average_temp: f64,
    /// Arrival order.
    pub sources: Vec<ProviderReading>,
}

/// Coordinate resolved by a geocoding lookup, only lives for one provider call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Latitude and longitude formatted with two decimals, as sent upstream.
    pub fn query_values(&self) -> (String, String) {
        (format!("{:.2}", self.latitude), format!("{:.2}", self.longitude))
    }
}

/// `{ "error": "..." }` body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
