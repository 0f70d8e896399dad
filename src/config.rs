//! Application configuration.
//!
//! Every value has a default and can be overridden through environment
//! variables (a `.env` file is loaded first):
//! - `ESETT_API_BASE_URL`: API base URL (default: https://api.opendata.esett.com)
//! - `ESETT_API_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `ESETT_UTC_OFFSET_HOURS`: display time offset from UTC (default: 2)
//! - `ESETT_LOOKBACK_DAYS`: default date range length, 0..=3650 (default: 30)
//! - `ESETT_TABLE_ROWS`: rows shown in the raw data grid (default: 100)

use crate::api::EsettClient;
use chrono::{FixedOffset, Offset, Utc};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Longest default date range accepted from the environment.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Viewer configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    /// eSett OpenData base URL
    pub api_base_url: String,
    /// HTTP timeout in seconds
    pub timeout_secs: u64,
    /// Hours added to UTC for displayed times
    pub utc_offset_hours: i32,
    /// Days between default start and end date
    pub lookback_days: i64,
    /// Rows in the raw data grid
    pub table_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: EsettClient::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            utc_offset_hours: 2,
            lookback_days: 30,
            table_rows: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ESETT_API_BASE_URL") {
            let url = url.trim();
            if !url.is_empty() {
                config.api_base_url = url.to_string();
            }
        }
        parse_into(&lookup, "ESETT_API_TIMEOUT_SECS", &mut config.timeout_secs);
        parse_into(&lookup, "ESETT_UTC_OFFSET_HOURS", &mut config.utc_offset_hours);
        parse_into(&lookup, "ESETT_LOOKBACK_DAYS", &mut config.lookback_days);
        parse_into(&lookup, "ESETT_TABLE_ROWS", &mut config.table_rows);

        if !(-12..=14).contains(&config.utc_offset_hours) {
            warn!(
                offset = config.utc_offset_hours,
                "UTC offset out of range, using default"
            );
            config.utc_offset_hours = Self::default().utc_offset_hours;
        }
        if !(0..=MAX_LOOKBACK_DAYS).contains(&config.lookback_days) {
            warn!(days = config.lookback_days, "lookback out of range, using default");
            config.lookback_days = Self::default().lookback_days;
        }

        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Display offset for timestamps.
    pub fn display_offset(&self) -> FixedOffset {
        // Range is checked in from_lookup; fall back to UTC for hand-built configs
        FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    /// Axis suffix such as `UTC+2`.
    pub fn offset_label(&self) -> String {
        match self.utc_offset_hours {
            0 => "UTC".to_string(),
            h if h > 0 => format!("UTC+{}", h),
            h => format!("UTC{}", h),
        }
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!(key, value = %raw, "ignoring unparseable setting"),
        }
    }
}
