use std::time::Duration;

use chrono_tz::Tz;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub duckdb_memory_limit: String,
    /// Zone used for day buckets when the request does not name one.
    pub timezone: Tz,
    /// HMAC secret for session tokens. `None` means a random secret is
    /// generated at startup and tokens do not survive a restart.
    pub session_secret: Option<String>,
    pub session_days: u32,
    pub cors_origins: Vec<String>,
    pub buffer_flush_interval_ms: u64,
    pub buffer_max_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("LINKFOLIO_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("LINKFOLIO_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            duckdb_memory_limit: std::env::var("LINKFOLIO_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            timezone: {
                let raw =
                    std::env::var("LINKFOLIO_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
                parse_timezone(&raw).map_err(|e| e.to_string())?
            },
            session_secret: std::env::var("LINKFOLIO_SESSION_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            session_days: std::env::var("LINKFOLIO_SESSION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .unwrap_or(7),
            cors_origins: std::env::var("LINKFOLIO_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            buffer_flush_interval_ms: std::env::var("LINKFOLIO_BUFFER_FLUSH_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            buffer_max_size: std::env::var("LINKFOLIO_BUFFER_MAX")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
        })
    }

    pub fn buffer_flush_interval(&self) -> Duration {
        Duration::from_millis(self.buffer_flush_interval_ms)
    }
}

/// Parse an IANA zone name such as `Europe/Madrid`.
pub fn parse_timezone(raw: &str) -> Result<Tz, CoreError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| CoreError::InvalidTimezone(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timezone_accepts_iana_names() {
        assert_eq!(parse_timezone("UTC").unwrap(), Tz::UTC);
        assert_eq!(
            parse_timezone("America/Argentina/Buenos_Aires").unwrap(),
            chrono_tz::America::Argentina::Buenos_Aires
        );
    }

    #[test]
    fn parse_timezone_rejects_garbage() {
        assert!(matches!(
            parse_timezone("Mars/Olympus"),
            Err(CoreError::InvalidTimezone(_))
        ));
    }
}
