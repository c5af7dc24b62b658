//! Tracing subscriber setup

use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Filter for a configured level, `info` when the level does not parse
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this twice
/// keeps the first subscriber.
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&config.level));

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer().with_target(false).json().boxed(),
        _ => fmt::layer().with_target(true).boxed(),
    };

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        info!(level = %config.level, format = %config.format, "tracing initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_uses_configured_level() {
        assert_eq!(level_filter("debug").to_string(), "debug");
        assert_eq!(level_filter("fmi_weather=trace").to_string(), "fmi_weather=trace");
    }
}
