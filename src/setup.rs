//! Integration setup
//!
//! Wires a configured place into a coordinator, registers it for
//! discovery and creates the weather entity and sensors.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::PersistentCache;
use crate::client::{ClientRegistry, ObservationSource, WeatherClient};
use crate::config::FmiConfig;
use crate::consts::{DATA_KEY, MIN_TIME_BETWEEN_UPDATES};
use crate::coordinator::FmiCoordinator;
use crate::entity::Entity;
use crate::lightning::{FmiLightningClient, LightningSource, NominatimGeocoder, http_client};
use crate::models::{Location, base_unique_id};
use crate::sensor::{FmiSensor, LightningSensor, SensorKind};
use crate::weather::{DiscoveryInfo, FmiWeather, setup_weather_platform};
use crate::{FmiError, Result};

/// Check that FMI knows the coordinates, returning the place name it reports
#[instrument(skip(source))]
pub async fn validate_user_config(
    source: &dyn ObservationSource,
    latitude: f64,
    longitude: f64,
) -> Result<String> {
    match source.weather_by_coordinates(latitude, longitude).await {
        Ok(weather) => Ok(weather.place),
        Err(e) => {
            error!("Unable to validate {latitude}, {longitude}: {e}");
            Err(FmiError::api(format!("Cannot connect to FMI: {e}")))
        }
    }
}

/// Lightning client built from configuration, with a persistent geocode
/// cache when caching is enabled
pub fn lightning_source(config: &FmiConfig) -> Result<Arc<dyn LightningSource>> {
    let time_zone = config
        .location
        .tz()
        .map_err(|e| FmiError::config(format!("{e:#}")))?;
    let http = http_client(&config.http)?;

    let cache = if config.cache.enabled {
        Some(PersistentCache::open(config.cache.path())?)
    } else {
        None
    };

    let geocoder = NominatimGeocoder::new(http.clone(), config.lightning.geocoder_url.clone(), cache);
    let client = FmiLightningClient::new(http, config.lightning.clone(), Box::new(geocoder))
        .with_time_zone(time_zone);
    Ok(Arc::new(client))
}

/// A set-up config entry and its entities
pub struct Integration {
    entry_id: String,
    coordinator: Arc<FmiCoordinator>,
    registry: ClientRegistry,
    weather: Vec<FmiWeather>,
    sensors: Vec<Box<dyn Entity>>,
}

impl Integration {
    /// Set up one config entry.
    ///
    /// Fails with [`FmiError::NotReady`] when the first refresh does not
    /// succeed, so the host can retry later.
    #[instrument(skip_all, fields(name = %config.location.name))]
    pub async fn setup(
        config: &FmiConfig,
        source: Arc<dyn ObservationSource>,
        lightning: Option<Arc<dyn LightningSource>>,
    ) -> Result<Self> {
        let time_zone = config
            .location
            .tz()
            .map_err(|e| FmiError::config(format!("{e:#}")))?;
        let location = Location::new(
            config.location.latitude,
            config.location.longitude,
            config.location.name.clone(),
        );

        let mut coordinator =
            FmiCoordinator::new(location, &config.options, source).with_time_zone(time_zone);
        if let Some(lightning) = lightning {
            coordinator = coordinator.with_lightning(lightning);
        }
        let coordinator = Arc::new(coordinator);

        coordinator
            .refresh()
            .await
            .map_err(|e| FmiError::not_ready(e.to_string()))?;

        let entry_id = base_unique_id(config.location.latitude, config.location.longitude);
        let mut registry = ClientRegistry::new();
        registry.insert(entry_id.clone(), coordinator.clone());

        let mut discovery = DiscoveryInfo::new();
        discovery.insert(DATA_KEY.to_string(), json!(entry_id));
        let weather = setup_weather_platform(&registry, Some(&discovery))?
            .into_iter()
            .map(|entity| match time_zone {
                Some(tz) => entity.with_time_zone(tz),
                None => entity,
            })
            .collect();

        let mut sensors: Vec<Box<dyn Entity>> = SensorKind::ALL
            .iter()
            .map(|kind| Box::new(FmiSensor::new(coordinator.clone(), *kind)) as Box<dyn Entity>)
            .collect();
        sensors.push(Box::new(LightningSensor::new(coordinator.clone())));

        info!("FMI entry {} set up with {} sensors", entry_id, sensors.len());
        Ok(Self {
            entry_id,
            coordinator,
            registry,
            weather,
            sensors,
        })
    }

    #[must_use]
    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<FmiCoordinator> {
        &self.coordinator
    }

    #[must_use]
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn weather(&self) -> &[FmiWeather] {
        &self.weather
    }

    /// Every entity of this entry, weather first
    pub fn entities(&self) -> impl Iterator<Item = &dyn Entity> {
        self.weather
            .iter()
            .map(|weather| weather as &dyn Entity)
            .chain(self.sensors.iter().map(|sensor| sensor.as_ref() as &dyn Entity))
    }

    /// Refresh the coordinator, then let the sensors pick up the new data
    pub async fn refresh_all(&mut self) -> Result<()> {
        self.coordinator.refresh().await?;
        for sensor in &mut self.sensors {
            sensor.update().await?;
        }
        debug!("Updated {} sensors", self.sensors.len());
        Ok(())
    }

    /// Poll forever. Failed refreshes are logged and the last good data stays.
    pub async fn run(&mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        // setup already refreshed once
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh_all().await {
                warn!("Refresh of {} failed: {}", self.entry_id, e);
            }
        }
    }

    /// Poll at the default update interval
    pub async fn poll(&mut self) {
        self.run(MIN_TIME_BETWEEN_UPDATES).await;
    }

    /// Drop the entities and unregister the coordinator
    pub fn unload(mut self) -> bool {
        self.weather.clear();
        self.sensors.clear();
        self.registry.remove(&self.entry_id).is_some()
    }
}
