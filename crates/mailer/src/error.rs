use thiserror::Error;

/// Errors from building or delivering a client email.
#[derive(Debug, Error)]
pub enum MailError {
    /// The relay could not be set up (bad host, TLS setup).
    #[error("SMTP relay unavailable: {0}")]
    Transport(String),

    /// The relay refused or dropped the message.
    #[error("SMTP delivery failed: {0}")]
    Send(String),

    /// The message could not be assembled.
    #[error("Could not build message: {0}")]
    BuildEmail(String),

    /// A sender, recipient or reply-to address did not parse.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// An `SMTP_*` variable has an unusable value.
    #[error("Invalid SMTP configuration: {0}")]
    Config(String),

    /// An `SMTP_*` variable required by the others is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}
