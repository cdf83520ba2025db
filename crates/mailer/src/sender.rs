use async_trait::async_trait;

use crate::{Email, MailError};

/// Anything that can deliver an [`Email`].
///
/// The web layer holds a `dyn EmailSender` so tests can swap in a recorder.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}
