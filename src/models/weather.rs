//! Weather record model and unit helpers

use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::Measurement;

/// One observation or forecast record
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherData {
    /// Time this record applies to
    pub time: DateTime<Utc>,
    /// FMI weather symbol code
    pub symbol: Measurement,
    /// Air temperature
    pub temperature: Measurement,
    /// Relative humidity
    pub humidity: Measurement,
    /// Air pressure
    pub pressure: Measurement,
    /// Precipitation amount over the last hour
    pub precipitation_amount: Measurement,
    /// Wind speed in m/s
    pub wind_speed: Measurement,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: Measurement,
    /// Wind gust speed in m/s
    pub wind_gust: Measurement,
    /// Cloud cover percentage
    pub cloud_cover: Measurement,
}

impl WeatherData {
    /// Symbol value as an FMI symbol code, if it is one
    #[must_use]
    pub fn symbol_code(&self) -> Option<u16> {
        let value = self.symbol.value;
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u16::MAX)
        {
            Some(value as u16)
        } else {
            None
        }
    }
}

/// Convert m/s to km/h, rounded to one decimal place
#[must_use]
pub fn ms_to_kmh(speed_ms: f64) -> f64 {
    (speed_ms * 3.6 * 10.0).round() / 10.0
}

/// Express a UTC instant in the configured zone, or the host's local zone
#[must_use]
pub fn to_local(time: DateTime<Utc>, time_zone: Option<Tz>) -> DateTime<FixedOffset> {
    match time_zone {
        Some(tz) => time.with_timezone(&tz).fixed_offset(),
        None => time.with_timezone(&Local).fixed_offset(),
    }
}
