//! Constants shared by the weather entity, sensors and coordinator

use std::time::Duration;

pub const DOMAIN: &str = "fmi";
pub const DEFAULT_NAME: &str = "FMI";
pub const MANUFACTURER: &str = "Finnish Meteorological Institute";
pub const ATTRIBUTION: &str = "Weather Data provided by FMI";

/// Discovery payload key naming the client to wrap
pub const DATA_KEY: &str = "data_key";

pub const MIN_TIME_BETWEEN_UPDATES: Duration = Duration::from_secs(30 * 60);
pub const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Forecast time steps (hours) accepted by FMI
pub const FORECAST_OFFSET: [u8; 8] = [1, 2, 3, 4, 6, 8, 12, 24];

pub const HUMIDITY_RANGE: std::ops::RangeInclusive<f64> = 1.0..=100.0;
pub const TEMP_RANGE: std::ops::RangeInclusive<f64> = -40.0..=49.0;
pub const WIND_SPEED_RANGE: std::ops::RangeInclusive<f64> = 0.0..=30.0;

pub const BEST_COND_SYMBOLS: [u16; 12] = [1, 2, 21, 3, 31, 32, 41, 42, 51, 52, 91, 92];
pub const BEST_CONDITION_AVAIL: &str = "available";
pub const BEST_CONDITION_NOT_AVAIL: &str = "not_available";

// Lightning strikes
pub const LIGHTNING_LIMIT: usize = 5;
pub const LIGHTNING_LOOKBACK_DAYS: i64 = 7;
/// FMI keeps lightning observations for a week
pub const LIGHTNING_MAX_LOOKBACK_DAYS: i64 = 7;
pub const LIGHTNING_BASE_URL: &str = "https://opendata.fmi.fi/wfs?service=WFS&version=2.0.0&request=getFeature&storedquery_id=fmi::observations::lightning::multipointcoverage&timestep=3600&";
pub const GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const USER_AGENT: &str = "fmi-weather/0.1.0";

// State attribute keys
pub const ATTR_ATTRIBUTION: &str = "attribution";
pub const ATTR_LOCATION: &str = "location";
pub const ATTR_TIME: &str = "time";
pub const ATTR_TEMPERATURE: &str = "temperature";
pub const ATTR_HUMIDITY: &str = "relative_humidity";
pub const ATTR_WIND_SPEED: &str = "wind_speed";
pub const ATTR_PRECIPITATION: &str = "precipitation";
pub const ATTR_DISTANCE: &str = "distance";
pub const ATTR_STRIKES: &str = "strikes";
pub const ATTR_PEAK_CURRENT: &str = "peak_current";
pub const ATTR_CLOUD_COVER: &str = "cloud_cover";
pub const ATTR_ELLIPSE_MAJOR: &str = "ellipse_major";
pub const ATTR_OBSERVATIONS: &str = "OBSERVATIONS";
