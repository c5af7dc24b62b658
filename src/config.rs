//! Configuration management for the FMI integration
//!
//! Handles loading configuration from files and environment variables
//! and validates the options the integration accepts.

use crate::FmiError;
use crate::best_time::Thresholds;
use crate::consts::{
    DEFAULT_NAME, FORECAST_OFFSET, GEOCODER_BASE_URL, HUMIDITY_RANGE, LIGHTNING_BASE_URL,
    LIGHTNING_LIMIT, LIGHTNING_LOOKBACK_DAYS, LIGHTNING_MAX_LOOKBACK_DAYS, TEMP_RANGE, WIND_SPEED_RANGE,
};
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FmiConfig {
    /// Where to observe and forecast
    pub location: LocationConfig,
    /// Forecast step and best-time thresholds
    pub options: OptionsConfig,
    /// Lightning query settings
    pub lightning: LightningConfig,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// IANA zone for reported times; the host's local zone when unset
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Forecast step in hours; 1 means sensors show current observations
    #[serde(default = "default_forecast_offset")]
    pub forecast_offset: u8,
    #[serde(default = "default_min_temperature")]
    pub min_temperature: f64,
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f64,
    #[serde(default = "default_min_humidity")]
    pub min_relative_humidity: f64,
    #[serde(default = "default_max_humidity")]
    pub max_relative_humidity: f64,
    #[serde(default = "default_min_wind_speed")]
    pub min_wind_speed: f64,
    #[serde(default = "default_max_wind_speed")]
    pub max_wind_speed: f64,
    #[serde(default = "default_min_precipitation")]
    pub min_precipitation: f64,
    #[serde(default = "default_max_precipitation")]
    pub max_precipitation: f64,
    /// Fetch lightning strikes on every refresh
    #[serde(default)]
    pub lightning: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightningConfig {
    #[serde(default = "default_lightning_base_url")]
    pub base_url: String,
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,
    /// Restrict the query to a box of this half side around home
    pub radius_km: Option<f64>,
    #[serde(default = "default_lightning_limit")]
    pub limit: usize,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache directory; defaults to the platform cache dir
    pub location: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_latitude() -> f64 {
    60.1699
}

fn default_longitude() -> f64 {
    24.9384
}

fn default_forecast_offset() -> u8 {
    1
}

fn default_min_temperature() -> f64 {
    Thresholds::default().min_temperature
}

fn default_max_temperature() -> f64 {
    Thresholds::default().max_temperature
}

fn default_min_humidity() -> f64 {
    Thresholds::default().min_humidity
}

fn default_max_humidity() -> f64 {
    Thresholds::default().max_humidity
}

fn default_min_wind_speed() -> f64 {
    Thresholds::default().min_wind_speed
}

fn default_max_wind_speed() -> f64 {
    Thresholds::default().max_wind_speed
}

fn default_min_precipitation() -> f64 {
    Thresholds::default().min_precipitation
}

fn default_max_precipitation() -> f64 {
    Thresholds::default().max_precipitation
}

fn default_lightning_base_url() -> String {
    LIGHTNING_BASE_URL.to_string()
}

fn default_geocoder_url() -> String {
    GEOCODER_BASE_URL.to_string()
}

fn default_lightning_limit() -> usize {
    LIGHTNING_LIMIT
}

fn default_lookback_days() -> i64 {
    LIGHTNING_LOOKBACK_DAYS
}

fn default_http_timeout() -> u32 {
    30
}

fn default_http_max_retries() -> u32 {
    3
}

fn default_cache_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            time_zone: None,
        }
    }
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            forecast_offset: default_forecast_offset(),
            min_temperature: default_min_temperature(),
            max_temperature: default_max_temperature(),
            min_relative_humidity: default_min_humidity(),
            max_relative_humidity: default_max_humidity(),
            min_wind_speed: default_min_wind_speed(),
            max_wind_speed: default_max_wind_speed(),
            min_precipitation: default_min_precipitation(),
            max_precipitation: default_max_precipitation(),
            lightning: false,
        }
    }
}

impl Default for LightningConfig {
    fn default() -> Self {
        Self {
            base_url: default_lightning_base_url(),
            geocoder_url: default_geocoder_url(),
            radius_km: None,
            limit: default_lightning_limit(),
            lookback_days: default_lookback_days(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            max_retries: default_http_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            location: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl OptionsConfig {
    /// Best-time thresholds from these options
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_temperature: self.min_temperature,
            max_temperature: self.max_temperature,
            min_humidity: self.min_relative_humidity,
            max_humidity: self.max_relative_humidity,
            min_wind_speed: self.min_wind_speed,
            max_wind_speed: self.max_wind_speed,
            min_precipitation: self.min_precipitation,
            max_precipitation: self.max_precipitation,
        }
    }
}

impl LocationConfig {
    /// Parsed time zone, `None` meaning the host's local zone
    pub fn tz(&self) -> Result<Option<Tz>> {
        self.time_zone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>().map_err(|_| {
                    anyhow::Error::from(FmiError::config(format!("Unknown time zone '{name}'")))
                })
            })
            .transpose()
    }
}

impl CacheConfig {
    /// Resolved cache directory
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.location.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("fmi-weather")
        })
    }
}

impl FmiConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // FMI_OPTIONS__FORECAST_OFFSET=3 and the like
        builder = builder.add_source(
            Environment::with_prefix("FMI")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: FmiConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fmi-weather").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.location.name.trim().is_empty() {
            self.location.name = default_name();
        }
        if self.lightning.base_url.is_empty() {
            self.lightning.base_url = default_lightning_base_url();
        }
        if self.lightning.geocoder_url.is_empty() {
            self.lightning.geocoder_url = default_geocoder_url();
        }
        if self.lightning.limit == 0 {
            self.lightning.limit = default_lightning_limit();
        }
        if self.http.timeout_seconds == 0 {
            self.http.timeout_seconds = default_http_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_location()?;
        self.validate_options()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_location(&self) -> Result<()> {
        let location = &self.location;
        if !(-90.0..=90.0).contains(&location.latitude) {
            return Err(FmiError::config(format!(
                "Latitude {} must be between -90 and 90",
                location.latitude
            ))
            .into());
        }
        if !(-180.0..=180.0).contains(&location.longitude) {
            return Err(FmiError::config(format!(
                "Longitude {} must be between -180 and 180",
                location.longitude
            ))
            .into());
        }
        location.tz()?;
        Ok(())
    }

    fn validate_options(&self) -> Result<()> {
        let options = &self.options;

        if !FORECAST_OFFSET.contains(&options.forecast_offset) {
            return Err(FmiError::config(format!(
                "Forecast offset {} must be one of {:?}",
                options.forecast_offset, FORECAST_OFFSET
            ))
            .into());
        }

        let ranges = [
            (
                "relative humidity",
                options.min_relative_humidity,
                options.max_relative_humidity,
                HUMIDITY_RANGE,
            ),
            (
                "temperature",
                options.min_temperature,
                options.max_temperature,
                TEMP_RANGE,
            ),
            (
                "wind speed",
                options.min_wind_speed,
                options.max_wind_speed,
                WIND_SPEED_RANGE,
            ),
        ];
        for (what, min, max, allowed) in ranges {
            if !allowed.contains(&min) || !allowed.contains(&max) {
                return Err(FmiError::config(format!(
                    "{what} thresholds must lie within {}..={}",
                    allowed.start(),
                    allowed.end()
                ))
                .into());
            }
            if min > max {
                return Err(FmiError::config(format!(
                    "Minimum {what} cannot exceed maximum {what}"
                ))
                .into());
            }
        }

        if options.min_precipitation < 0.0 || options.min_precipitation > options.max_precipitation {
            return Err(FmiError::config(
                "Precipitation thresholds must be non-negative with minimum not above maximum",
            )
            .into());
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.http.timeout_seconds > 300 {
            return Err(FmiError::config("HTTP timeout cannot exceed 300 seconds").into());
        }

        if self.http.max_retries > 10 {
            return Err(FmiError::config("HTTP max retries cannot exceed 10").into());
        }

        if let Some(radius) = self.lightning.radius_km {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(FmiError::config("Lightning radius must be positive").into());
            }
        }

        if !(1..=LIGHTNING_MAX_LOOKBACK_DAYS).contains(&self.lightning.lookback_days) {
            return Err(FmiError::config(format!(
                "Lightning lookback must be between 1 and {LIGHTNING_MAX_LOOKBACK_DAYS} days"
            ))
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(FmiError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(FmiError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [&self.lightning.base_url, &self.lightning.geocoder_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(FmiError::config(format!(
                    "'{url}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
