//! `fmi-weather` - Finnish Meteorological Institute weather for home automation
//!
//! This library exposes FMI observations and forecasts as a weather entity,
//! a set of sensors (including a best-time-of-day sensor) and a lightning
//! strike sensor, all backed by one polling coordinator per configured place.

pub mod best_time;
pub mod cache;
pub mod client;
pub mod config;
pub mod consts;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod lightning;
pub mod logging;
pub mod models;
pub mod sensor;
pub mod setup;
pub mod symbols;
pub mod weather;

// Re-export core types for public API
pub use best_time::{BestConditions, Thresholds};
pub use cache::PersistentCache;
pub use client::{ClientRegistry, ObservationSource, WeatherClient};
pub use config::FmiConfig;
pub use coordinator::FmiCoordinator;
pub use entity::Entity;
pub use error::FmiError;
pub use lightning::{FmiLightningClient, LightningSource, LightningStrike, NominatimGeocoder};
pub use models::{BoundingBox, CurrentWeather, Forecast, Location, Measurement, WeatherData};
pub use sensor::{FmiSensor, LightningSensor, SensorKind, SensorState};
pub use setup::{Integration, validate_user_config};
pub use symbols::Condition;
pub use weather::{DiscoveryInfo, FmiWeather, ForecastEntry, setup_weather_platform};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, FmiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
