//! Application settings built from the `[section] key` config and validated
//! before anything starts.
//!
//! ```ini
//! [alphavantage]
//! base_url = https://www.alphavantage.co/query
//! timeout_secs = 30
//!
//! [dashboard]
//! symbol = BTCUSD
//! interval = 5min
//! poll_interval_secs = 15
//! rsi_period = 14
//!
//! [web]
//! listen = 127.0.0.1:3000
//!
//! [credentials]
//! key_file = alphachart_credentials.ini
//! persist = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::error::AlphaChartError;
use crate::domain::indicator::DEFAULT_RSI_PERIOD;
use crate::domain::interval::Interval;
use crate::domain::query::normalize_symbol;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_SYMBOL: &str = "BTCUSD";
pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 15;
pub const DEFAULT_TIMEOUT_SECS: i64 = 30;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";
pub const DEFAULT_KEY_FILE: &str = "alphachart_credentials.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub default_symbol: String,
    pub default_interval: Interval,
    pub poll_interval: Duration,
    pub rsi_period: usize,
    pub listen: String,
    pub key_file: PathBuf,
    pub persist_key: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS as u64),
            default_symbol: DEFAULT_SYMBOL.to_string(),
            default_interval: Interval::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS as u64),
            rsi_period: DEFAULT_RSI_PERIOD,
            listen: DEFAULT_LISTEN.to_string(),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            persist_key: true,
        }
    }
}

impl AppConfig {
    /// Reads every setting, falling back to defaults for absent keys.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AlphaChartError> {
        let base_url = config
            .get_string("alphavantage", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        validate_base_url(&base_url)?;

        let timeout_secs = positive_int(config, "alphavantage", "timeout_secs", DEFAULT_TIMEOUT_SECS)?;

        let default_symbol = normalize_symbol(
            &config
                .get_string("dashboard", "symbol")
                .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
        );

        let default_interval = match config.get_string("dashboard", "interval") {
            Some(raw) => raw.parse::<Interval>().map_err(|e| AlphaChartError::ConfigInvalid {
                section: "dashboard".into(),
                key: "interval".into(),
                reason: e.to_string(),
            })?,
            None => Interval::default(),
        };

        let poll_secs = positive_int(
            config,
            "dashboard",
            "poll_interval_secs",
            DEFAULT_POLL_INTERVAL_SECS,
        )?;

        let rsi_period = positive_int(config, "dashboard", "rsi_period", DEFAULT_RSI_PERIOD as i64)?;

        let listen = config
            .get_string("web", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        if listen.trim().is_empty() {
            return Err(AlphaChartError::ConfigInvalid {
                section: "web".into(),
                key: "listen".into(),
                reason: "listen address must not be empty".into(),
            });
        }

        let key_file = config
            .get_string("credentials", "key_file")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_FILE));

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs as u64),
            default_symbol,
            default_interval,
            poll_interval: Duration::from_secs(poll_secs as u64),
            rsi_period: rsi_period as usize,
            listen,
            key_file,
            persist_key: config.get_bool("credentials", "persist", true),
        })
    }
}

fn validate_base_url(url: &str) -> Result<(), AlphaChartError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(AlphaChartError::ConfigInvalid {
            section: "alphavantage".into(),
            key: "base_url".into(),
            reason: format!("'{}' is not an http(s) URL", url),
        })
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, AlphaChartError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AlphaChartError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("'{}' is not an integer", raw),
        })?;
    if value <= 0 {
        return Err(AlphaChartError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{} must be positive", key),
        });
    }
    Ok(value)
}
