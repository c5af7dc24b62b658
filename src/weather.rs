//! Weather entity backed by an FMI weather client
//!
//! `FmiWeather` is a read-only projection of a shared [`WeatherClient`]:
//! every accessor re-reads the client's latest snapshot, and `update`
//! only asks the client to refresh itself.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::client::{ClientRegistry, WeatherClient};
use crate::consts::{ATTRIBUTION, DATA_KEY, DOMAIN, MANUFACTURER};
use crate::entity::Entity;
use crate::models::weather::{ms_to_kmh, to_local};
use crate::models::{CurrentWeather, WeatherData};
use crate::symbols::{Condition, condition_at};
use crate::{FmiError, Result};

/// Runtime configuration handed to a platform by discovery
pub type DiscoveryInfo = serde_json::Map<String, serde_json::Value>;

/// One forecast hour in the shape the weather platform expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub datetime: DateTime<FixedOffset>,
    pub condition: Option<Condition>,
    pub temperature: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub wind_bearing: f64,
    pub pressure: f64,
    pub humidity: f64,
}

impl ForecastEntry {
    fn from_record(record: &WeatherData, time_zone: Option<Tz>) -> Self {
        Self {
            datetime: to_local(record.time, time_zone),
            condition: record.symbol_code().and_then(Condition::from_symbol),
            temperature: record.temperature.value,
            precipitation: record.precipitation_amount.value,
            wind_speed: record.wind_speed.value,
            wind_bearing: record.wind_direction.value,
            pressure: record.pressure.value,
            humidity: record.humidity.value,
        }
    }
}

/// Weather entity exposing current conditions and the hourly forecast
pub struct FmiWeather {
    client: Option<Arc<dyn WeatherClient>>,
    name: Option<String>,
    time_zone: Option<Tz>,
}

impl FmiWeather {
    /// Wrap a client. The display name is captured now and never re-read.
    #[must_use]
    pub fn new(client: Option<Arc<dyn WeatherClient>>) -> Self {
        let name = client.as_ref().map(|client| client.name());
        Self {
            client,
            name,
            time_zone: None,
        }
    }

    /// Report forecast times in this zone instead of the host's local zone
    #[must_use]
    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = Some(time_zone);
        self
    }

    fn current(&self) -> Option<Arc<CurrentWeather>> {
        self.client.as_ref()?.current()
    }

    /// Read one field of the latest observation
    fn observed<T>(&self, field: impl FnOnce(&WeatherData) -> T) -> Option<T> {
        self.current().map(|current| field(&current.data))
    }

    pub fn available(&self) -> bool {
        self.current().is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn attribution(&self) -> &'static str {
        ATTRIBUTION
    }

    pub fn temperature(&self) -> Option<f64> {
        self.observed(|data| data.temperature.value)
    }

    pub fn temperature_unit(&self) -> Option<String> {
        self.observed(|data| data.temperature.unit.clone())
    }

    pub fn humidity(&self) -> Option<f64> {
        self.observed(|data| data.humidity.value)
    }

    pub fn precipitation(&self) -> Option<f64> {
        self.observed(|data| data.precipitation_amount.value)
    }

    pub fn pressure(&self) -> Option<f64> {
        self.observed(|data| data.pressure.value)
    }

    /// Wind speed in km/h
    pub fn wind_speed(&self) -> Option<f64> {
        self.observed(|data| ms_to_kmh(data.wind_speed.value))
    }

    pub fn wind_bearing(&self) -> Option<f64> {
        self.observed(|data| data.wind_direction.value)
    }

    pub fn condition(&self) -> Option<Condition> {
        self.condition_at(Utc::now())
    }

    fn condition_at(&self, now: DateTime<Utc>) -> Option<Condition> {
        let client = self.client.as_ref()?;
        let code = client.current()?.data.symbol_code()?;
        condition_at(code, client.coordinates(), now)
    }

    /// Forecast hours in source order, or `None` before any forecast exists
    pub fn forecast(&self) -> Option<Vec<ForecastEntry>> {
        let hourly = self.client.as_ref()?.hourly()?;
        Some(
            hourly
                .forecasts
                .iter()
                .map(|record| ForecastEntry::from_record(record, self.time_zone))
                .collect(),
        )
    }

    /// Refresh the wrapped client. Failures are returned untouched.
    #[instrument(name = "weather_update", skip(self), fields(name = ?self.name))]
    pub async fn update(&self) -> Result<()> {
        match &self.client {
            Some(client) => client.refresh().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Entity for FmiWeather {
    fn platform(&self) -> &'static str {
        "weather"
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn available(&self) -> bool {
        FmiWeather::available(self)
    }

    fn state_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "platform": "weather",
            "available": FmiWeather::available(self),
            "state": self.condition(),
            "device": {
                "domain": DOMAIN,
                "manufacturer": MANUFACTURER,
            },
            "attributes": {
                "temperature": self.temperature(),
                "temperature_unit": self.temperature_unit(),
                "humidity": self.humidity(),
                "pressure": self.pressure(),
                "precipitation": self.precipitation(),
                "wind_speed": self.wind_speed(),
                "wind_bearing": self.wind_bearing(),
                "attribution": ATTRIBUTION,
                "forecast": self.forecast(),
            },
        })
    }

    async fn update(&mut self) -> Result<()> {
        FmiWeather::update(self).await
    }
}

/// Create the weather entity named by a discovery payload
///
/// Without discovery info, or without a `data_key` in it, no entity is
/// created. A key that names no registered client is a configuration error.
pub fn setup_weather_platform(
    registry: &ClientRegistry,
    discovery_info: Option<&DiscoveryInfo>,
) -> Result<Vec<FmiWeather>> {
    let Some(info) = discovery_info else {
        debug!("No discovery info, skipping weather platform");
        return Ok(Vec::new());
    };

    let Some(key) = info.get(DATA_KEY) else {
        debug!("Discovery info has no {DATA_KEY}, skipping weather platform");
        return Ok(Vec::new());
    };

    let key = key
        .as_str()
        .ok_or_else(|| FmiError::config(format!("{DATA_KEY} must be a string")))?;
    let client = registry
        .get(key)
        .ok_or_else(|| FmiError::config(format!("No FMI client registered for {key}")))?;

    debug!("Creating weather entity for {}", key);
    Ok(vec![FmiWeather::new(Some(client))])
}
