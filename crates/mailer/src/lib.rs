//! # mailer
//!
//! SMTP client for sending email to clients from Tracker Suite.
//!
//! ```no_run
//! use mailer::{Email, EmailSender, SmtpConfig, SmtpMailer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailer::MailError> {
//!     let config = SmtpConfig::new("smtp.example.com", 587, "crm@example.com")
//!         .with_credentials("crm@example.com", "app-password");
//!     let mailer = SmtpMailer::new(config)?;
//!
//!     let email = Email::new("client@example.org", "Checking in", "Hi there!");
//!     mailer.send(&email).await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod sender;
mod types;

pub use client::SmtpMailer;
pub use config::SmtpConfig;
pub use error::MailError;
pub use sender::EmailSender;
pub use types::Email;

// Re-export async_trait for implementors
pub use async_trait::async_trait;
