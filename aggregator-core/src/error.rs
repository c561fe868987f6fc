use thiserror::Error;

/// Failures that reach the caller of [`crate::WeatherAggregator::aggregate`].
///
/// Per-provider failures never show up here; they are logged and dropped
/// inside the fan-out.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("City parameter is required")]
    MissingCity,

    #[error("Failed to fetch weather data from any source")]
    NoData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            AggregateError::MissingCity.to_string(),
            "City parameter is required"
        );
        assert!(AggregateError::NoData.to_string().contains("any source"));
    }
}
