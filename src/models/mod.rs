//! Data models for the FMI integration
//!
//! This module contains the core domain models organized by concern:
//! - Measurement: a value with its unit as reported by FMI
//! - Weather: a single observation or forecast record
//! - Forecast: current weather and forecast collections
//! - Location: geographic coordinates, bounding boxes and distances

pub mod forecast;
pub mod location;
pub mod measurement;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{CurrentWeather, Forecast};
pub use location::{BoundingBox, Location, base_unique_id};
pub use measurement::Measurement;
pub use weather::WeatherData;
