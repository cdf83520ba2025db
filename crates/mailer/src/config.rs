use secrecy::{ExposeSecret, SecretString};
use std::env;

use crate::MailError;

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP host
    pub host: String,
    /// SMTP port (default: 587, STARTTLS)
    pub port: u16,
    /// Login name, if the relay needs authentication
    pub username: Option<String>,
    /// Address used in the From header
    pub from_address: String,
    password: Option<SecretString>,
}

impl SmtpConfig {
    /// Create a configuration for an unauthenticated relay.
    pub fn new(host: impl Into<String>, port: u16, from_address: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            from_address: from_address.into(),
            password: None,
        }
    }

    /// Builder method to add login credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Returns `Ok(None)` when `SMTP_HOST` is unset, meaning email is disabled.
    ///
    /// - `SMTP_HOST` - relay host
    /// - `SMTP_PORT` - Default: 587
    /// - `SMTP_FROM` - From address (required when `SMTP_HOST` is set)
    /// - `SMTP_USERNAME` / `SMTP_PASSWORD` - optional, must be set together
    pub fn from_env() -> Result<Option<Self>, MailError> {
        let Ok(host) = env::var("SMTP_HOST") else {
            return Ok(None);
        };

        let port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|e| MailError::Config(format!("Invalid SMTP_PORT: {}", e)))?;

        let from_address =
            env::var("SMTP_FROM").map_err(|_| MailError::MissingEnvVar("SMTP_FROM".to_string()))?;

        let config = Self::new(host, port, from_address);

        match (env::var("SMTP_USERNAME").ok(), env::var("SMTP_PASSWORD").ok()) {
            (Some(username), Some(password)) => {
                Ok(Some(config.with_credentials(username, password)))
            }
            (None, None) => Ok(Some(config)),
            (Some(_), None) => Err(MailError::MissingEnvVar("SMTP_PASSWORD".to_string())),
            (None, Some(_)) => Err(MailError::MissingEnvVar("SMTP_USERNAME".to_string())),
        }
    }

    /// Get the password (exposes the secret).
    pub(crate) fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.expose_secret())
    }
}
