//! Current weather and forecast collections

use super::WeatherData;
use serde::{Deserialize, Serialize};

/// Latest observation for a place
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentWeather {
    /// Place name resolved by FMI for the requested coordinates
    pub place: String,
    pub data: WeatherData,
}

/// Hourly (or multi-hour step) forecast for a place
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Forecast {
    pub place: String,
    /// Forecast records in the order FMI returned them
    pub forecasts: Vec<WeatherData>,
}

impl Forecast {
    /// Create new forecast
    #[must_use]
    pub fn new(place: String, forecasts: Vec<WeatherData>) -> Self {
        Self { place, forecasts }
    }

    /// Record at the given position, counted from the first forecast hour
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<&WeatherData> {
        self.forecasts.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forecasts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather::fixtures::record;

    #[test]
    fn test_forecast_accessors() {
        let forecast = Forecast::new(
            "Helsinki".to_string(),
            vec![record(12, 1.0, 15.0), record(13, 2.0, 18.0)],
        );

        assert_eq!(forecast.len(), 2);
        assert!(!forecast.is_empty());
        assert_eq!(forecast.nth(1).map(|r| r.temperature.value), Some(18.0));
        assert!(forecast.nth(2).is_none());
    }
}
