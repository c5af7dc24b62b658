//! Data update coordinator
//!
//! Owns the latest FMI observation, forecast, best-time evaluation and
//! lightning strikes for one configured place. Entities read snapshots;
//! only `refresh` replaces them.

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::best_time::{BestConditions, Thresholds};
use crate::client::{ObservationSource, WeatherClient};
use crate::config::OptionsConfig;
use crate::consts::REFRESH_TIMEOUT;
use crate::lightning::{LightningSource, LightningStrike};
use crate::models::weather::to_local;
use crate::models::{CurrentWeather, Forecast, Location};
use crate::{FmiError, Result};

#[derive(Default)]
struct Snapshot {
    current: Option<Arc<CurrentWeather>>,
    forecast: Option<Arc<Forecast>>,
    best: Option<Arc<BestConditions>>,
    lightning: Option<Arc<Vec<LightningStrike>>>,
}

pub struct FmiCoordinator {
    location: Location,
    time_step: u8,
    thresholds: Thresholds,
    lightning_enabled: bool,
    time_zone: Option<Tz>,
    timeout: Duration,
    source: Arc<dyn ObservationSource>,
    lightning_source: Option<Arc<dyn LightningSource>>,
    state: RwLock<Snapshot>,
}

impl FmiCoordinator {
    pub fn new(location: Location, options: &OptionsConfig, source: Arc<dyn ObservationSource>) -> Self {
        debug!(
            "Using lat: {} and lon: {}, step {}h",
            location.latitude, location.longitude, options.forecast_offset
        );
        Self {
            location,
            time_step: options.forecast_offset,
            thresholds: options.thresholds(),
            lightning_enabled: options.lightning,
            time_zone: None,
            timeout: REFRESH_TIMEOUT,
            source,
            lightning_source: None,
            state: RwLock::new(Snapshot::default()),
        }
    }

    /// Source queried when lightning is enabled in the options
    #[must_use]
    pub fn with_lightning(mut self, source: Arc<dyn LightningSource>) -> Self {
        self.lightning_source = Some(source);
        self
    }

    #[must_use]
    pub fn with_time_zone(mut self, time_zone: Option<Tz>) -> Self {
        self.time_zone = time_zone;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn time_step(&self) -> u8 {
        self.time_step
    }

    #[must_use]
    pub fn time_zone(&self) -> Option<Tz> {
        self.time_zone
    }

    pub fn best_conditions(&self) -> Option<Arc<BestConditions>> {
        self.read(|s| s.best.clone())
    }

    /// Strikes of the last refresh, closest first; `None` until fetched
    pub fn lightning(&self) -> Option<Arc<Vec<LightningStrike>>> {
        self.read(|s| s.lightning.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    async fn fetch(&self) -> Result<()> {
        let Location {
            latitude,
            longitude,
            ..
        } = self.location;

        let current = self
            .source
            .weather_by_coordinates(latitude, longitude)
            .await
            .map_err(|e| FmiError::update(format!("Unable to get current weather: {e}")))?;
        let forecast = self
            .source
            .forecast_by_coordinates(latitude, longitude, self.time_step)
            .await
            .map_err(|e| FmiError::update(format!("Unable to get forecast: {e}")))?;

        let today = to_local(Utc::now(), self.time_zone).date_naive();
        let best = BestConditions::evaluate(
            &current,
            &forecast,
            &self.thresholds,
            self.time_zone,
            today,
        );
        debug!("Best time of day: {} at {}", best.state, best.time);

        let lightning = match (&self.lightning_source, self.lightning_enabled) {
            (Some(source), true) => match source.strikes_near(&self.location).await {
                Ok(strikes) => Some(Arc::new(strikes)),
                Err(e) => {
                    warn!("Lightning update failed, keeping previous strikes: {e}");
                    self.lightning()
                }
            },
            _ => None,
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.current = Some(Arc::new(current));
        state.forecast = Some(Arc::new(forecast));
        state.best = Some(Arc::new(best));
        state.lightning = lightning;
        Ok(())
    }
}

#[async_trait]
impl WeatherClient for FmiCoordinator {
    fn name(&self) -> String {
        self.location.name.clone()
    }

    fn current(&self) -> Option<Arc<CurrentWeather>> {
        self.read(|s| s.current.clone())
    }

    fn hourly(&self) -> Option<Arc<Forecast>> {
        self.read(|s| s.forecast.clone())
    }

    fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.location.latitude, self.location.longitude))
    }

    #[instrument(name = "coordinator_refresh", skip(self), fields(place = %self.location.name))]
    async fn refresh(&self) -> Result<()> {
        tokio::time::timeout(self.timeout, self.fetch())
            .await
            .map_err(|_| {
                FmiError::update(format!(
                    "FMI did not answer within {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;
        info!("FMI data refreshed for {}", self.location.name);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::models::weather::fixtures::record;
    use std::sync::Mutex;

    /// Observation source returning canned data, or an error once armed
    pub struct CannedSource {
        pub place: String,
        pub temperature: Mutex<f64>,
        pub fail_with: Mutex<Option<String>>,
        pub delay: Option<Duration>,
        pub requested_steps: Mutex<Vec<u8>>,
    }

    impl CannedSource {
        pub fn new(place: &str) -> Self {
            Self {
                place: place.to_string(),
                temperature: Mutex::new(18.0),
                fail_with: Mutex::new(None),
                delay: None,
                requested_steps: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ObservationSource for CannedSource {
        async fn weather_by_coordinates(&self, _lat: f64, _lon: f64) -> Result<CurrentWeather> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = self.fail_with.lock().unwrap().clone() {
                return Err(FmiError::api(message));
            }
            Ok(CurrentWeather {
                place: self.place.clone(),
                data: record(9, 1.0, *self.temperature.lock().unwrap()),
            })
        }

        async fn forecast_by_coordinates(
            &self,
            _lat: f64,
            _lon: f64,
            timestep_hours: u8,
        ) -> Result<Forecast> {
            self.requested_steps.lock().unwrap().push(timestep_hours);
            Ok(Forecast::new(
                self.place.clone(),
                vec![record(10, 1.0, 19.0), record(11, 2.0, 22.0), record(12, 33.0, 25.0)],
            ))
        }
    }
}
