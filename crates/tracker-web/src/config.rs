//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use database::StageThresholds;
use mailer::{MailError, SmtpConfig};

use crate::state::Settings;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Request-time settings handed to [`crate::state::AppState`].
    pub settings: Settings,
    /// Outbound email; `None` disables the send-email endpoint.
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `TRACKER_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:tracker.db?mode=rwc` |
    /// | `SESSION_TTL_HOURS` | Session lifetime | `168` |
    /// | `COOKIE_SECURE` | Set the `Secure` cookie flag | `false` |
    /// | `REMINDER_UTC_OFFSET_MINUTES` | Offset defining "today" | `0` |
    /// | `JOURNEY_STAGE_LEVELS` | Min level for exploring,active,power_user,expert | `2,4,7,10` |
    /// | `TRIAL_DAYS` | Trial length for new users | `14` |
    /// | `REQUEST_TIMEOUT_SECS` | Per-request timeout | `30` |
    /// | `STATIC_DIR` | Frontend bundle to serve | (unset) |
    /// | `SMTP_*` | See [`SmtpConfig::from_env`] | email disabled |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("TRACKER_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:tracker.db?mode=rwc".to_string());

        let defaults = Settings::default();

        let session_ttl = session_ttl(parse_var("SESSION_TTL_HOURS", 168)?)?;
        let reminder_offset = reminder_offset(parse_var("REMINDER_UTC_OFFSET_MINUTES", 0)?)?;

        let stage_thresholds = match env::var("JOURNEY_STAGE_LEVELS") {
            Ok(value) => StageThresholds::parse(&value)
                .ok_or_else(|| ConfigError::invalid("JOURNEY_STAGE_LEVELS", value))?,
            Err(_) => defaults.stage_thresholds,
        };

        let trial_days = trial_days(parse_var("TRIAL_DAYS", defaults.trial_days)?)?;

        let timeout_secs: u64 = parse_var("REQUEST_TIMEOUT_SECS", 30)?;

        let settings = Settings {
            session_ttl,
            cookie_secure: parse_var("COOKIE_SECURE", false)?,
            reminder_offset,
            stage_thresholds,
            trial_days,
            password_hashing: defaults.password_hashing,
            request_timeout: Duration::from_secs(timeout_secs),
            static_dir: env::var("STATIC_DIR").ok().map(PathBuf::from),
        };

        Ok(Self {
            addr,
            database_url,
            settings,
            smtp: SmtpConfig::from_env()?,
        })
    }
}

/// Longest accepted session lifetime, one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// Longest accepted trial, ten years.
pub const MAX_TRIAL_DAYS: i64 = 3660;

fn session_ttl(hours: i64) -> Result<chrono::Duration, ConfigError> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        return Err(ConfigError::invalid("SESSION_TTL_HOURS", hours));
    }
    Ok(chrono::Duration::hours(hours))
}

fn reminder_offset(minutes: i32) -> Result<FixedOffset, ConfigError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ConfigError::invalid("REMINDER_UTC_OFFSET_MINUTES", minutes))
}

fn trial_days(days: i64) -> Result<i64, ConfigError> {
    if !(0..=MAX_TRIAL_DAYS).contains(&days) {
        return Err(ConfigError::invalid("TRIAL_DAYS", days));
    }
    Ok(days)
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TRACKER_ADDR format")]
    InvalidAddr,

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Email configuration: {0}")]
    Mail(#[from] MailError),
}

impl ConfigError {
    fn invalid(name: &'static str, value: impl ToString) -> Self {
        ConfigError::Invalid {
            name,
            value: value.to_string(),
        }
    }
}
