//! FMI weather symbol to platform condition mapping

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use sunrise::{Coordinates, SolarDay, SolarEvent};

/// Weather condition understood by the home-automation platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    ClearNight,
    Sunny,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    Rainy,
    Pouring,
    Cloudy,
    SnowyRainy,
    Snowy,
    Lightning,
    LightningRainy,
    Fog,
}

impl Condition {
    /// Map an FMI symbol code. Codes FMI does not define yield `None`.
    #[must_use]
    pub fn from_symbol(code: u16) -> Option<Self> {
        let condition = match code {
            0 => Self::ClearNight, // not an FMI code, used for clear nights
            1 => Self::Sunny,
            2 => Self::PartlyCloudy,
            21 | 31 | 32 | 71 | 72 | 81 | 82 => Self::Rainy,
            22 | 23 | 33 | 73 | 83 => Self::Pouring,
            3 | 42 => Self::Cloudy,
            41 => Self::SnowyRainy,
            43 | 51 | 52 | 53 => Self::Snowy,
            61 | 63 => Self::Lightning,
            62 | 64 => Self::LightningRainy,
            91 | 92 => Self::Fog,
            _ => return None,
        };
        Some(condition)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearNight => "clear-night",
            Self::Sunny => "sunny",
            Self::PartlyCloudy => "partlycloudy",
            Self::Rainy => "rainy",
            Self::Pouring => "pouring",
            Self::Cloudy => "cloudy",
            Self::SnowyRainy => "snowy-rainy",
            Self::Snowy => "snowy",
            Self::Lightning => "lightning",
            Self::LightningRainy => "lightning-rainy",
            Self::Fog => "fog",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sunrise and sunset for a date. `None` during polar day or night.
#[must_use]
pub fn sunrise_sunset(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let coordinates = Coordinates::new(latitude, longitude)?;
    let solar_day = SolarDay::new(coordinates, date);

    let sunrise = solar_day.event_time(SolarEvent::Sunrise)?;
    let sunset = solar_day.event_time(SolarEvent::Sunset)?;
    Some((sunrise, sunset))
}

/// Calendar date at the place by mean solar time, 15 degrees of longitude per hour
fn solar_date(longitude: f64, now: DateTime<Utc>) -> NaiveDate {
    let offset = Duration::seconds((longitude * 240.0).round() as i64);
    now.checked_add_signed(offset)
        .unwrap_or(now)
        .date_naive()
}

/// Map a symbol, reporting a clear sky outside daylight hours as a clear night
#[must_use]
pub fn condition_at(
    code: u16,
    coordinates: Option<(f64, f64)>,
    now: DateTime<Utc>,
) -> Option<Condition> {
    let condition = Condition::from_symbol(code)?;
    if condition != Condition::Sunny {
        return Some(condition);
    }

    let Some((latitude, longitude)) = coordinates else {
        return Some(condition);
    };

    match sunrise_sunset(latitude, longitude, solar_date(longitude, now)) {
        Some((sunrise, sunset)) if now <= sunrise || now >= sunset => Some(Condition::ClearNight),
        _ => Some(condition),
    }
}
