//! Best time of the day derived from the forecast
//!
//! Walks today's forecast hours and picks the warmest hour once any hour
//! meets all user thresholds (symbol, wind, temperature, humidity,
//! precipitation).

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::consts::{BEST_COND_SYMBOLS, BEST_CONDITION_AVAIL, BEST_CONDITION_NOT_AVAIL};
use crate::models::weather::to_local;
use crate::models::{CurrentWeather, Forecast, WeatherData};

/// Inclusive ranges an hour must fall within
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub min_humidity: f64,
    pub max_humidity: f64,
    pub min_wind_speed: f64,
    pub max_wind_speed: f64,
    pub min_precipitation: f64,
    pub max_precipitation: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_temperature: 10.0,
            max_temperature: 30.0,
            min_humidity: 30.0,
            max_humidity: 70.0,
            min_wind_speed: 0.0,
            max_wind_speed: 25.0,
            min_precipitation: 0.0,
            max_precipitation: 0.2,
        }
    }
}

impl Thresholds {
    #[must_use]
    pub fn accepts(&self, record: &WeatherData) -> bool {
        let symbol_ok = record
            .symbol_code()
            .is_some_and(|code| BEST_COND_SYMBOLS.contains(&code));

        symbol_ok
            && (self.min_wind_speed..=self.max_wind_speed).contains(&record.wind_speed.value)
            && (self.min_temperature..=self.max_temperature).contains(&record.temperature.value)
            && (self.min_humidity..=self.max_humidity).contains(&record.humidity.value)
            && (self.min_precipitation..=self.max_precipitation)
                .contains(&record.precipitation_amount.value)
    }
}

/// Outcome of the best-time evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestConditions {
    /// `available` once any hour today met all thresholds
    pub state: String,
    pub time: DateTime<FixedOffset>,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation: f64,
}

impl BestConditions {
    fn from_record(record: &WeatherData, time_zone: Option<Tz>) -> Self {
        Self {
            state: BEST_CONDITION_NOT_AVAIL.to_string(),
            time: to_local(record.time, time_zone),
            temperature: record.temperature.value,
            humidity: record.humidity.value,
            wind_speed: record.wind_speed.value,
            precipitation: record.precipitation_amount.value,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.state == BEST_CONDITION_AVAIL
    }

    /// Evaluate today's forecast hours, starting from the current observation
    #[must_use]
    pub fn evaluate(
        current: &CurrentWeather,
        forecast: &Forecast,
        thresholds: &Thresholds,
        time_zone: Option<Tz>,
        today: NaiveDate,
    ) -> Self {
        let mut best = Self::from_record(&current.data, time_zone);

        for record in &forecast.forecasts {
            let local_time = to_local(record.time, time_zone);
            if local_time.date_naive() > today {
                break;
            }

            if thresholds.accepts(record) {
                best.state = BEST_CONDITION_AVAIL.to_string();
            }

            if best.is_available() && record.temperature.value > best.temperature {
                best.time = local_time;
                best.temperature = record.temperature.value;
                best.humidity = record.humidity.value;
                best.wind_speed = record.wind_speed.value;
                best.precipitation = record.precipitation_amount.value;
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::weather::fixtures::record;

    const TZ: Option<Tz> = Some(chrono_tz::UTC);

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn current(temperature: f64) -> CurrentWeather {
        CurrentWeather {
            place: "Kumpula".to_string(),
            data: record(9, 1.0, temperature),
        }
    }

    fn forecast(records: Vec<WeatherData>) -> Forecast {
        Forecast::new("Kumpula".to_string(), records)
    }

    #[test]
    fn test_thresholds_accept_pleasant_hour() {
        let thresholds = Thresholds::default();
        assert!(thresholds.accepts(&record(12, 1.0, 20.0)));
        // Symbol 33 (heavy rain) is never a good hour
        assert!(!thresholds.accepts(&record(12, 33.0, 20.0)));
        // Too hot
        assert!(!thresholds.accepts(&record(12, 1.0, 31.0)));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let thresholds = Thresholds::default();
        let mut hour = record(12, 2.0, 30.0);
        hour.humidity.value = 70.0;
        hour.precipitation_amount.value = 0.2;
        hour.wind_speed.value = 25.0;
        assert!(thresholds.accepts(&hour));
    }

    #[test]
    fn test_no_qualifying_hour_keeps_current() {
        let records = vec![record(10, 33.0, 25.0), record(11, 61.0, 26.0)];
        let best = BestConditions::evaluate(
            &current(15.0),
            &forecast(records),
            &Thresholds::default(),
            TZ,
            today(),
        );

        assert!(!best.is_available());
        assert_eq!(best.state, "not_available");
        assert_eq!(best.temperature, 15.0);
        assert_eq!(best.time.to_rfc3339(), "2024-06-15T09:00:00+00:00");
    }

    #[test]
    fn test_picks_warmest_hour_after_first_match() {
        let records = vec![
            record(10, 1.0, 18.0),
            record(11, 33.0, 24.0),
            record(12, 2.0, 22.0),
        ];
        let best = BestConditions::evaluate(
            &current(15.0),
            &forecast(records),
            &Thresholds::default(),
            TZ,
            today(),
        );

        assert!(best.is_available());
        // Once available, any warmer hour of today wins, even a rainy one
        assert_eq!(best.temperature, 24.0);
        assert_eq!(best.time.to_rfc3339(), "2024-06-15T11:00:00+00:00");
    }

    #[test]
    fn test_stops_at_tomorrow() {
        let mut tomorrow = record(10, 1.0, 28.0);
        tomorrow.time += chrono::Duration::days(1);
        let records = vec![record(22, 1.0, 16.0), tomorrow];

        let best = BestConditions::evaluate(
            &current(15.0),
            &forecast(records),
            &Thresholds::default(),
            TZ,
            today(),
        );

        assert!(best.is_available());
        assert_eq!(best.temperature, 16.0);
    }
}
