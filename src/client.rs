//! Seams between the entities and the weather data they project
//!
//! `WeatherClient` is the handle an entity wraps: it holds the latest
//! observation and forecast and knows how to refresh them.
//! `ObservationSource` is the low-level FMI data client the coordinator
//! pulls from; it is supplied by the embedding application.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::Result;
use crate::models::{CurrentWeather, Forecast};

/// Handle to the latest weather data for one place
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Display name of the handle
    fn name(&self) -> String;

    /// Latest observation, if one has been fetched
    fn current(&self) -> Option<Arc<CurrentWeather>>;

    /// Latest forecast, if one has been fetched
    fn hourly(&self) -> Option<Arc<Forecast>>;

    /// Coordinates used for daylight-aware conditions
    fn coordinates(&self) -> Option<(f64, f64)> {
        None
    }

    /// Fetch fresh data
    async fn refresh(&self) -> Result<()>;
}

/// Low-level FMI observation and forecast client
#[async_trait]
pub trait ObservationSource: Send + Sync {
    async fn weather_by_coordinates(&self, latitude: f64, longitude: f64)
    -> Result<CurrentWeather>;

    async fn forecast_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
        timestep_hours: u8,
    ) -> Result<Forecast>;
}

/// Weather clients available to discovery, keyed by data key
#[derive(Default, Clone)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn WeatherClient>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: Into<String>>(&mut self, key: S, client: Arc<dyn WeatherClient>) {
        self.clients.insert(key.into(), client);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<dyn WeatherClient>> {
        self.clients.get(key).cloned()
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<dyn WeatherClient>> {
        self.clients.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::FmiError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory client with scripted refresh results
    #[derive(Default)]
    pub struct StaticClient {
        pub name: String,
        pub current: Option<Arc<CurrentWeather>>,
        pub hourly: Option<Arc<Forecast>>,
        pub coordinates: Option<(f64, f64)>,
        pub fail_with: Mutex<Option<String>>,
        pub refreshes: AtomicUsize,
    }

    impl StaticClient {
        pub fn named(name: &str) -> Self {
            Self {
                name: name.to_string(),
                ..Self::default()
            }
        }

        pub fn refresh_count(&self) -> usize {
            self.refreshes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherClient for StaticClient {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn current(&self) -> Option<Arc<CurrentWeather>> {
            self.current.clone()
        }

        fn hourly(&self) -> Option<Arc<Forecast>> {
            self.hourly.clone()
        }

        fn coordinates(&self) -> Option<(f64, f64)> {
            self.coordinates
        }

        async fn refresh(&self) -> Result<()> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            match self.fail_with.lock().unwrap().clone() {
                Some(message) => Err(FmiError::api(message)),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ClientRegistry::new();
        assert!(registry.is_empty());

        registry.insert("entry-1", Arc::new(StaticClient::named("Espoo")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("entry-1").map(|c| c.name()), Some("Espoo".to_string()));
        assert!(registry.get("entry-2").is_none());

        assert!(registry.remove("entry-1").is_some());
        assert!(registry.is_empty());
    }
}
