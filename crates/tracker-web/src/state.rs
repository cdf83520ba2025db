//! Application state shared across handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use database::{Database, StageThresholds};
use mailer::EmailSender;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashing {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Request-time policy knobs loaded from configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// How long a login session stays valid.
    pub session_ttl: chrono::Duration,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
    /// Offset used to decide what "today" means for reminders.
    pub reminder_offset: FixedOffset,
    /// Minimum level per journey stage.
    pub stage_thresholds: StageThresholds,
    /// Trial length for newly registered users.
    pub trial_days: i64,
    pub password_hashing: PasswordHashing,
    pub request_timeout: Duration,
    /// Pre-built frontend bundle to serve for non-API paths.
    pub static_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_ttl: chrono::Duration::hours(168),
            cookie_secure: false,
            reminder_offset: Utc.fix(),
            stage_thresholds: StageThresholds::default(),
            trial_days: 14,
            password_hashing: PasswordHashing::default(),
            request_timeout: Duration::from_secs(30),
            static_dir: None,
        }
    }
}

impl Settings {
    /// Current time in the reminder offset.
    pub fn local_now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.reminder_offset)
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Outbound email, absent when SMTP is not configured.
    pub mailer: Option<Arc<dyn EmailSender>>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, mailer: Option<Arc<dyn EmailSender>>, settings: Settings) -> Self {
        Self {
            db,
            mailer,
            settings: Arc::new(settings),
        }
    }
}
