//! Sensor entities fed by the coordinator
//!
//! One `FmiSensor` per [`SensorKind`] plus a `LightningSensor`. Sensors
//! never refresh the coordinator themselves; `update` recomputes their
//! state from its latest snapshots.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, Timelike};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::Result;
use crate::client::WeatherClient;
use crate::consts::{
    ATTR_ATTRIBUTION, ATTR_CLOUD_COVER, ATTR_DISTANCE, ATTR_ELLIPSE_MAJOR, ATTR_HUMIDITY,
    ATTR_LOCATION, ATTR_OBSERVATIONS, ATTR_PEAK_CURRENT, ATTR_PRECIPITATION, ATTR_STRIKES,
    ATTR_TEMPERATURE, ATTR_TIME, ATTR_WIND_SPEED, ATTRIBUTION,
};
use crate::coordinator::FmiCoordinator;
use crate::entity::Entity;
use crate::lightning::LightningStrike;
use crate::models::WeatherData;
use crate::models::weather::to_local;
use crate::symbols::Condition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Place,
    Weather,
    Temperature,
    WindSpeed,
    Humidity,
    Clouds,
    Rain,
    ForecastTime,
    BestTime,
}

impl SensorKind {
    pub const ALL: [SensorKind; 9] = [
        SensorKind::Place,
        SensorKind::Weather,
        SensorKind::Temperature,
        SensorKind::WindSpeed,
        SensorKind::Humidity,
        SensorKind::Clouds,
        SensorKind::Rain,
        SensorKind::ForecastTime,
        SensorKind::BestTime,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            SensorKind::Place => "place",
            SensorKind::Weather => "weather",
            SensorKind::Temperature => "temperature",
            SensorKind::WindSpeed => "wind_speed",
            SensorKind::Humidity => "humidity",
            SensorKind::Clouds => "clouds",
            SensorKind::Rain => "rain",
            SensorKind::ForecastTime => "forecast_time",
            SensorKind::BestTime => "time",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            SensorKind::Place => "Place",
            SensorKind::Weather => "Condition",
            SensorKind::Temperature => "Temperature",
            SensorKind::WindSpeed => "Wind speed",
            SensorKind::Humidity => "Humidity",
            SensorKind::Clouds => "Cloud Coverage",
            SensorKind::Rain => "Rain",
            SensorKind::ForecastTime => "Time",
            SensorKind::BestTime => "Best Time Of Day",
        }
    }

    #[must_use]
    pub fn unit(self) -> Option<&'static str> {
        match self {
            SensorKind::Temperature => Some("°C"),
            SensorKind::WindSpeed => Some("m/s"),
            SensorKind::Humidity | SensorKind::Clouds => Some("%"),
            SensorKind::Rain => Some("mm/hr"),
            _ => None,
        }
    }

    #[must_use]
    pub fn icon(self) -> Option<&'static str> {
        match self {
            SensorKind::Place => Some("mdi:city-variant"),
            SensorKind::Weather => None,
            SensorKind::Temperature => Some("mdi:thermometer"),
            SensorKind::WindSpeed => Some("mdi:weather-windy"),
            SensorKind::Humidity => Some("mdi:water"),
            SensorKind::Clouds => Some("mdi:weather-cloudy"),
            SensorKind::Rain => Some("mdi:weather-pouring"),
            SensorKind::ForecastTime | SensorKind::BestTime => Some("mdi:av-timer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorState {
    Text(String),
    Number(f64),
    Time(DateTime<FixedOffset>),
}

/// Pick the record a forecast-driven sensor reports.
///
/// With a one hour step the current observation is used. Otherwise from
/// half past onwards the second forecast record is shown, before that the
/// first.
fn source_record(coordinator: &FmiCoordinator, minute: u32) -> Option<WeatherData> {
    if coordinator.time_step() == 1 {
        return coordinator.current().map(|current| current.data.clone());
    }

    let forecast = coordinator.hourly()?;
    let index = if forecast.len() > 1 && minute >= 30 { 1 } else { 0 };
    forecast.nth(index).cloned()
}

pub struct FmiSensor {
    coordinator: Arc<FmiCoordinator>,
    kind: SensorKind,
    state: Option<SensorState>,
}

impl FmiSensor {
    pub fn new(coordinator: Arc<FmiCoordinator>, kind: SensorKind) -> Self {
        let mut sensor = Self {
            coordinator,
            kind,
            state: None,
        };
        sensor.recompute(Local::now().minute());
        sensor
    }

    #[must_use]
    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> Option<&SensorState> {
        self.state.as_ref()
    }

    fn recompute(&mut self, minute: u32) {
        let Some(current) = self.coordinator.current() else {
            return;
        };

        if self.kind == SensorKind::Place {
            self.state = Some(SensorState::Text(current.place.clone()));
            return;
        }

        if self.kind == SensorKind::BestTime {
            self.state = self
                .coordinator
                .best_conditions()
                .map(|best| SensorState::Text(best.state.clone()));
            return;
        }

        let Some(record) = source_record(&self.coordinator, minute) else {
            return;
        };

        self.state = match self.kind {
            SensorKind::ForecastTime => Some(SensorState::Time(to_local(
                record.time,
                self.coordinator.time_zone(),
            ))),
            SensorKind::Weather => record
                .symbol_code()
                .and_then(Condition::from_symbol)
                .map(|condition| SensorState::Text(condition.as_str().to_string())),
            SensorKind::Temperature => Some(SensorState::Number(record.temperature.value)),
            SensorKind::WindSpeed => Some(SensorState::Number(record.wind_speed.value)),
            SensorKind::Humidity => Some(SensorState::Number(record.humidity.value)),
            SensorKind::Clouds => Some(SensorState::Number(record.cloud_cover.value)),
            SensorKind::Rain => Some(SensorState::Number(record.precipitation_amount.value)),
            SensorKind::Place | SensorKind::BestTime => None,
        };
    }

    fn attributes(&self) -> Value {
        if self.kind == SensorKind::BestTime {
            if let (Some(current), Some(best)) =
                (self.coordinator.current(), self.coordinator.best_conditions())
            {
                return json!({
                    ATTR_LOCATION: current.place,
                    ATTR_TIME: best.time,
                    ATTR_TEMPERATURE: best.temperature,
                    ATTR_HUMIDITY: best.humidity,
                    ATTR_PRECIPITATION: best.precipitation,
                    ATTR_WIND_SPEED: best.wind_speed,
                    ATTR_ATTRIBUTION: ATTRIBUTION,
                });
            }
        }
        json!({ ATTR_ATTRIBUTION: ATTRIBUTION })
    }
}

#[async_trait]
impl Entity for FmiSensor {
    fn platform(&self) -> &'static str {
        "sensor"
    }

    fn name(&self) -> Option<String> {
        let name = self.kind.display_name();
        Some(match self.coordinator.current() {
            Some(current) => format!("{} {name}", current.place),
            None => name.to_string(),
        })
    }

    fn available(&self) -> bool {
        self.coordinator.current().is_some()
    }

    fn state_json(&self) -> Value {
        json!({
            "name": Entity::name(self),
            "platform": "sensor",
            "available": Entity::available(self),
            "state": self.state,
            "unit_of_measurement": self.kind.unit(),
            "icon": self.kind.icon(),
            "attributes": self.attributes(),
        })
    }

    async fn update(&mut self) -> Result<()> {
        self.recompute(Local::now().minute());
        Ok(())
    }
}

const LIGHTNING_NAME: &str = "Lightning Strikes";
const LIGHTNING_UNAVAILABLE: &str = "Unavailable";

fn strike_json(strike: &LightningStrike) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(ATTR_LOCATION.to_string(), json!(strike.location));
    map.insert(ATTR_TIME.to_string(), json!(strike.time));
    map.insert(ATTR_DISTANCE.to_string(), json!(strike.distance));
    map.insert(ATTR_STRIKES.to_string(), json!(strike.strikes));
    map.insert(ATTR_PEAK_CURRENT.to_string(), json!(strike.peak_current));
    map.insert(ATTR_CLOUD_COVER.to_string(), json!(strike.cloud_cover));
    map.insert(ATTR_ELLIPSE_MAJOR.to_string(), json!(strike.ellipse_major));
    map
}

/// Closest recent lightning strike, with the others as observations
pub struct LightningSensor {
    coordinator: Arc<FmiCoordinator>,
    state: String,
}

impl LightningSensor {
    pub fn new(coordinator: Arc<FmiCoordinator>) -> Self {
        let mut sensor = Self {
            coordinator,
            state: LIGHTNING_UNAVAILABLE.to_string(),
        };
        sensor.recompute();
        sensor
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    fn recompute(&mut self) {
        self.state = self
            .coordinator
            .lightning()
            .and_then(|strikes| strikes.first().map(|strike| strike.location.clone()))
            .unwrap_or_else(|| LIGHTNING_UNAVAILABLE.to_string());
    }

    fn attributes(&self) -> Value {
        let Some(strikes) = self.coordinator.lightning() else {
            return json!({});
        };
        let Some((first, rest)) = strikes.split_first() else {
            return json!({});
        };

        let mut attributes = strike_json(first);
        attributes.insert(
            ATTR_OBSERVATIONS.to_string(),
            Value::Array(rest.iter().map(|s| Value::Object(strike_json(s))).collect()),
        );
        attributes.insert(ATTR_ATTRIBUTION.to_string(), json!(ATTRIBUTION));
        Value::Object(attributes)
    }
}

#[async_trait]
impl Entity for LightningSensor {
    fn platform(&self) -> &'static str {
        "sensor"
    }

    fn name(&self) -> Option<String> {
        let place = self
            .coordinator
            .current()
            .map_or_else(|| self.coordinator.name(), |current| current.place.clone());
        Some(format!("{place} {LIGHTNING_NAME}"))
    }

    fn available(&self) -> bool {
        self.coordinator.current().is_some()
    }

    fn state_json(&self) -> Value {
        json!({
            "name": Entity::name(self),
            "platform": "sensor",
            "available": Entity::available(self),
            "state": self.state,
            "icon": "mdi:weather-lightning",
            "attributes": self.attributes(),
        })
    }

    async fn update(&mut self) -> Result<()> {
        self.recompute();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionsConfig;
    use crate::coordinator::fakes::CannedSource;
    use crate::lightning::LightningSource;
    use crate::models::Location;
    use rstest::rstest;

    fn coordinator(step: u8) -> Arc<FmiCoordinator> {
        let options = OptionsConfig {
            forecast_offset: step,
            ..OptionsConfig::default()
        };
        Arc::new(
            FmiCoordinator::new(
                Location::new(60.2, 24.96, "FMI".to_string()),
                &options,
                Arc::new(CannedSource::new("Kumpula")),
            )
            .with_time_zone(Some(chrono_tz::UTC)),
        )
    }

    async fn refreshed(step: u8) -> Arc<FmiCoordinator> {
        let coordinator = coordinator(step);
        coordinator.refresh().await.unwrap();
        coordinator
    }

    #[test]
    fn test_sensor_before_first_refresh() {
        let sensor = FmiSensor::new(coordinator(1), SensorKind::Temperature);
        assert!(sensor.state().is_none());
        assert!(!Entity::available(&sensor));
        assert_eq!(Entity::name(&sensor).as_deref(), Some("Temperature"));
    }

    #[rstest]
    #[case(SensorKind::Place, SensorState::Text("Kumpula".to_string()))]
    #[case(SensorKind::Weather, SensorState::Text("sunny".to_string()))]
    #[case(SensorKind::Temperature, SensorState::Number(18.0))]
    #[case(SensorKind::WindSpeed, SensorState::Number(4.0))]
    #[case(SensorKind::Humidity, SensorState::Number(50.0))]
    #[case(SensorKind::Clouds, SensorState::Number(20.0))]
    #[case(SensorKind::Rain, SensorState::Number(0.0))]
    #[case(SensorKind::BestTime, SensorState::Text("available".to_string()))]
    #[tokio::test]
    async fn test_one_hour_step_reads_current(#[case] kind: SensorKind, #[case] expected: SensorState) {
        let sensor = FmiSensor::new(refreshed(1).await, kind);
        assert_eq!(sensor.state(), Some(&expected));
    }

    #[rstest]
    #[case(10, 19.0)]
    #[case(29, 19.0)]
    #[case(30, 22.0)]
    #[case(59, 22.0)]
    #[tokio::test]
    async fn test_multi_hour_step_picks_record_by_minute(#[case] minute: u32, #[case] expected: f64) {
        let mut sensor = FmiSensor::new(refreshed(3).await, SensorKind::Temperature);
        sensor.recompute(minute);
        assert_eq!(sensor.state(), Some(&SensorState::Number(expected)));
    }

    #[tokio::test]
    async fn test_forecast_time_is_local() {
        let mut sensor = FmiSensor::new(refreshed(3).await, SensorKind::ForecastTime);
        sensor.recompute(0);
        match sensor.state() {
            Some(SensorState::Time(time)) => {
                assert_eq!(time.to_rfc3339(), "2024-06-15T10:00:00+00:00");
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_name_includes_place_once_data_exists() {
        let sensor = FmiSensor::new(refreshed(1).await, SensorKind::Clouds);
        assert_eq!(Entity::name(&sensor).as_deref(), Some("Kumpula Cloud Coverage"));

        let state = sensor.state_json();
        assert_eq!(state["unit_of_measurement"], "%");
        assert_eq!(state["icon"], "mdi:weather-cloudy");
        assert_eq!(state["attributes"][ATTR_ATTRIBUTION], ATTRIBUTION);
    }

    #[tokio::test]
    async fn test_best_time_attributes() {
        let sensor = FmiSensor::new(refreshed(1).await, SensorKind::BestTime);
        let attributes = &sensor.state_json()["attributes"];

        assert_eq!(attributes[ATTR_LOCATION], "Kumpula");
        assert_eq!(attributes[ATTR_TEMPERATURE], 25.0);
        assert_eq!(attributes[ATTR_HUMIDITY], 50.0);
        assert_eq!(attributes[ATTR_ATTRIBUTION], ATTRIBUTION);

        let time = attributes[ATTR_TIME].as_str().unwrap();
        let time = DateTime::parse_from_rfc3339(time).unwrap();
        assert_eq!(time.to_utc().to_rfc3339(), "2024-06-15T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_best_time_attributes_in_local_zone() {
        let coordinator = Arc::new(
            FmiCoordinator::new(
                Location::new(60.2, 24.96, "FMI".to_string()),
                &OptionsConfig::default(),
                Arc::new(CannedSource::new("Kumpula")),
            )
            .with_time_zone(Some(chrono_tz::Europe::Helsinki)),
        );
        coordinator.refresh().await.unwrap();

        let sensor = FmiSensor::new(coordinator, SensorKind::BestTime);
        assert_eq!(
            sensor.state_json()["attributes"][ATTR_TIME],
            "2024-06-15T15:00:00+03:00"
        );
    }

    #[test]
    fn test_sensor_kind_table() {
        assert_eq!(SensorKind::ALL.len(), 9);
        assert_eq!(SensorKind::BestTime.key(), "time");
        assert_eq!(SensorKind::Rain.unit(), Some("mm/hr"));
        assert!(SensorKind::Weather.icon().is_none());
    }

    struct TwoStrikes;

    #[async_trait]
    impl LightningSource for TwoStrikes {
        async fn strikes_near(&self, _home: &Location) -> Result<Vec<LightningStrike>> {
            let time = DateTime::parse_from_rfc3339("2024-06-15T12:00:00+03:00").unwrap();
            let strike = |location: &str, distance: f64| LightningStrike {
                time,
                location: location.to_string(),
                distance,
                strikes: 1.0,
                peak_current: -9.0,
                cloud_cover: 0.0,
                ellipse_major: 0.6,
            };
            Ok(vec![strike("Sipoo", 21.0), strike("Lohja", 48.5)])
        }
    }

    #[tokio::test]
    async fn test_lightning_sensor_without_strikes() {
        let sensor = LightningSensor::new(coordinator(1));
        assert_eq!(sensor.state(), "Unavailable");
        assert_eq!(Entity::name(&sensor).as_deref(), Some("FMI Lightning Strikes"));
        assert_eq!(sensor.state_json()["attributes"], json!({}));
    }

    #[tokio::test]
    async fn test_lightning_sensor_reports_closest_strike() {
        let options = OptionsConfig {
            lightning: true,
            ..OptionsConfig::default()
        };
        let coordinator = Arc::new(
            FmiCoordinator::new(
                Location::new(60.2, 24.96, "FMI".to_string()),
                &options,
                Arc::new(CannedSource::new("Kumpula")),
            )
            .with_lightning(Arc::new(TwoStrikes)),
        );
        let mut sensor = LightningSensor::new(coordinator.clone());
        coordinator.refresh().await.unwrap();
        sensor.update().await.unwrap();

        assert_eq!(sensor.state(), "Sipoo");
        assert_eq!(Entity::name(&sensor).as_deref(), Some("Kumpula Lightning Strikes"));

        let attributes = &sensor.state_json()["attributes"];
        assert_eq!(attributes[ATTR_DISTANCE], 21.0);
        assert_eq!(attributes[ATTR_OBSERVATIONS].as_array().unwrap().len(), 1);
        assert_eq!(attributes[ATTR_OBSERVATIONS][0][ATTR_LOCATION], "Lohja");
        assert_eq!(attributes[ATTR_ATTRIBUTION], ATTRIBUTION);
    }
}
