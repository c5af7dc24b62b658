//! Lightning strike observations near home
//!
//! Fetches FMI's lightning multipoint coverage, keeps the strikes closest
//! to home and names their locations through a reverse geocoder.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use chrono_tz::Tz;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::cache::{PersistentCache, jittered};
use crate::config::{HttpConfig, LightningConfig};
use crate::consts::USER_AGENT;
use crate::models::weather::to_local;
use crate::models::{BoundingBox, Location};
use crate::{FmiError, Result};

const GEOCODE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A lightning observation, closest strikes first before time ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightningStrike {
    pub time: DateTime<FixedOffset>,
    /// Reverse geocoded address, or "lat, lon" when unknown
    pub location: String,
    /// Distance from home in km
    pub distance: f64,
    pub strikes: f64,
    pub peak_current: f64,
    pub cloud_cover: f64,
    pub ellipse_major: f64,
}

/// Strike position and measurements as read from the coverage document
#[derive(Debug, Clone, PartialEq)]
pub struct RawStrike {
    pub latitude: f64,
    pub longitude: f64,
    pub epoch: i64,
    pub strikes: f64,
    pub peak_current: f64,
    pub cloud_cover: f64,
    pub ellipse_major: f64,
}

/// Source of recent lightning strikes around a location
#[async_trait]
pub trait LightningSource: Send + Sync {
    async fn strikes_near(&self, home: &Location) -> Result<Vec<LightningStrike>>;
}

/// Turns coordinates into a human readable address
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String>;
}

fn parse_number<T: std::str::FromStr>(token: Option<&str>, what: &str) -> Result<T> {
    token
        .and_then(|t| t.parse::<T>().ok())
        .ok_or_else(|| FmiError::parse(format!("Invalid {what} in lightning data")))
}

fn text_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Parse a WFS lightning multipoint coverage document
///
/// `positions` holds `lat lon epoch` per strike; `doubleOrNilReasonTupleList`
/// holds `strikes peak_current cloud_cover ellipse_major` in the same order.
pub fn parse_coverage(xml: &str) -> Result<Vec<RawStrike>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut positions: Vec<(f64, f64, i64)> = Vec::new();
    let mut values: Vec<[f64; 4]> = Vec::new();
    let mut current_tag: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_tag = Some(e.local_name().as_ref().to_vec());
            }
            Ok(Event::End(_)) => current_tag = None,
            Ok(Event::Text(t)) => {
                let raw: &[u8] = &t;
                let text = std::str::from_utf8(raw)
                    .map_err(|e| FmiError::parse(format!("Lightning data is not UTF-8: {e}")))?;
                match current_tag.as_deref() {
                    Some(b"positions") => {
                        for line in text_lines(text) {
                            let mut parts = line.split_whitespace();
                            positions.push((
                                parse_number(parts.next(), "latitude")?,
                                parse_number(parts.next(), "longitude")?,
                                parse_number::<f64>(parts.next(), "time")? as i64,
                            ));
                        }
                    }
                    Some(b"doubleOrNilReasonTupleList") => {
                        for line in text_lines(text) {
                            let mut parts = line.split_whitespace();
                            values.push([
                                parse_number(parts.next(), "multiplicity")?,
                                parse_number(parts.next(), "peak current")?,
                                parse_number(parts.next(), "cloud indicator")?,
                                parse_number(parts.next(), "ellipse major")?,
                            ]);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(FmiError::parse(format!(
                    "Invalid lightning XML at {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }

    if positions.len() != values.len() {
        warn!(
            "Lightning record mismatch: {} positions, {} value rows",
            positions.len(),
            values.len()
        );
    }

    Ok(positions
        .into_iter()
        .zip(values)
        .map(|((latitude, longitude, epoch), [strikes, peak_current, cloud_cover, ellipse_major])| {
            RawStrike {
                latitude,
                longitude,
                epoch,
                strikes,
                peak_current,
                cloud_cover,
                ellipse_major,
            }
        })
        .collect())
}

/// Keep the `limit` strikes closest to home, newest first, with their distances
#[must_use]
pub fn closest_strikes(raw: Vec<RawStrike>, home: &Location, limit: usize) -> Vec<(RawStrike, f64)> {
    let mut with_distance: Vec<(RawStrike, f64)> = raw
        .into_iter()
        .map(|strike| {
            let distance = home.distance_km(strike.latitude, strike.longitude);
            (strike, distance)
        })
        .collect();

    with_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
    with_distance.truncate(limit);
    with_distance.sort_by(|a, b| b.0.epoch.cmp(&a.0.epoch));
    with_distance
}

/// FMI open data lightning client
pub struct FmiLightningClient {
    http: ClientWithMiddleware,
    config: LightningConfig,
    geocoder: Box<dyn ReverseGeocoder>,
    time_zone: Option<Tz>,
}

/// Shared HTTP client with retries for transient failures
pub fn http_client(http: &HttpConfig) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(http.timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| FmiError::api(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(http.max_retries);
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

impl FmiLightningClient {
    pub fn new(
        http: ClientWithMiddleware,
        config: LightningConfig,
        geocoder: Box<dyn ReverseGeocoder>,
    ) -> Self {
        Self {
            http,
            config,
            geocoder,
            time_zone: None,
        }
    }

    #[must_use]
    pub fn with_time_zone(mut self, time_zone: Option<Tz>) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Query URL for strikes since `now` minus the lookback window
    pub fn query_url(&self, home: &Location, now: DateTime<Utc>) -> Result<String> {
        let lookback_days = self.config.lookback_days;
        let start = ChronoDuration::try_days(lookback_days)
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or_else(|| {
                FmiError::validation(format!(
                    "Lightning lookback of {lookback_days} days is out of range"
                ))
            })?;
        let mut url = format!(
            "{}starttime={}&",
            self.config.base_url,
            start.format("%Y-%m-%dT%H:%M:%SZ")
        );

        if let Some(radius_km) = self.config.radius_km {
            let bbox = BoundingBox::around(home.latitude, home.longitude, radius_km)?;
            url.push_str(&format!("bbox={}&", bbox.to_query()));
        }

        Ok(url)
    }

    async fn name_location(&self, latitude: f64, longitude: f64) -> String {
        match self.geocoder.reverse(latitude, longitude).await {
            Ok(address) => address,
            Err(e) => {
                info!("Unable to reverse geocode {latitude}, {longitude}: {e}");
                Location::new(latitude, longitude, String::new()).format_coordinates()
            }
        }
    }
}

#[async_trait]
impl LightningSource for FmiLightningClient {
    #[instrument(skip(self), fields(lat = home.latitude, lon = home.longitude))]
    async fn strikes_near(&self, home: &Location) -> Result<Vec<LightningStrike>> {
        let url = self.query_url(home, Utc::now())?;
        debug!("Fetching lightning strikes from {}", url);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FmiError::api(format!(
                "Lightning query failed with status {}",
                response.status()
            )));
        }
        let body = response.text().await?;

        let raw = parse_coverage(&body)?;
        debug!("Lightning coverage holds {} strikes", raw.len());

        let mut strikes = Vec::new();
        for (strike, distance) in closest_strikes(raw, home, self.config.limit) {
            let time = DateTime::from_timestamp(strike.epoch, 0)
                .ok_or_else(|| FmiError::parse(format!("Invalid strike time {}", strike.epoch)))?;
            strikes.push(LightningStrike {
                time: to_local(time, self.time_zone),
                location: self.name_location(strike.latitude, strike.longitude).await,
                distance,
                strikes: strike.strikes,
                peak_current: strike.peak_current,
                cloud_cover: strike.cloud_cover,
                ellipse_major: strike.ellipse_major,
            });
        }

        Ok(strikes)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    display_name: Option<String>,
}

/// Nominatim reverse geocoder with an optional persistent cache
pub struct NominatimGeocoder {
    http: ClientWithMiddleware,
    base_url: String,
    cache: Option<PersistentCache>,
}

impl NominatimGeocoder {
    pub fn new(http: ClientWithMiddleware, base_url: String, cache: Option<PersistentCache>) -> Self {
        Self {
            http,
            base_url,
            cache,
        }
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<String> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={latitude}&lon={longitude}&accept-language=en",
            self.base_url.trim_end_matches('/')
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FmiError::api(format!(
                "Reverse geocoding failed with status {}",
                response.status()
            )));
        }

        let body: NominatimResponse = response.json().await?;
        body.display_name
            .ok_or_else(|| FmiError::api(format!("No address for {latitude}, {longitude}")))
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String> {
        let key = Location::new(latitude, longitude, String::new()).cache_key();

        if let Some(cache) = &self.cache {
            match cache.get::<String>(&key).await {
                Ok(Some(address)) => return Ok(address),
                Ok(None) => {}
                Err(e) => warn!("Geocode cache read failed: {e:#}"),
            }
        }

        let address = self.lookup(latitude, longitude).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, address.clone(), jittered(GEOCODE_TTL)).await {
                warn!("Geocode cache write failed: {e:#}");
            }
        }

        Ok(address)
    }
}
