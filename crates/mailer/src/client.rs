use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument};

use crate::{Email, EmailSender, MailError, SmtpConfig};

/// Client for sending emails through an SMTP relay.
///
/// Uses connection pooling for efficient batch sending.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new client with the given configuration.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.port);

        if let (Some(username), Some(password)) = (config.username.clone(), config.password()) {
            builder = builder.credentials(Credentials::new(username, password.to_string()));
        }

        info!(
            host = %config.host,
            port = config.port,
            from = %config.from_address,
            "Created SMTP client"
        );

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    #[instrument(skip(self, email), fields(to = ?email.to, subject = %email.subject))]
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = build_message(&self.from_address, email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        info!(to = ?email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

fn parse_mailbox(label: &str, address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|e| MailError::InvalidAddress(format!("{} '{}': {}", label, address, e)))
}

/// Build a lettre Message from our Email type.
pub(crate) fn build_message(from: &str, email: &Email) -> Result<Message, MailError> {
    if email.to.is_empty() {
        return Err(MailError::BuildEmail("no recipients".to_string()));
    }

    let mut builder = Message::builder()
        .from(parse_mailbox("From", from)?)
        .subject(&email.subject);

    for to in &email.to {
        builder = builder.to(parse_mailbox("To", to)?);
    }

    for cc in &email.cc {
        builder = builder.cc(parse_mailbox("CC", cc)?);
    }

    if let Some(reply_to) = &email.reply_to {
        builder = builder.reply_to(parse_mailbox("Reply-To", reply_to)?);
    }

    let message = match &email.html_body {
        // Multipart alternative: text + HTML
        Some(html) => builder.multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(email.body.clone()))
                .singlepart(SinglePart::html(html.clone())),
        ),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone()),
    };

    message.map_err(|e| MailError::BuildEmail(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message() {
        let mut email = Email::new("jane@acme.test", "Renewal", "Hi Jane");
        email.reply_to("rep@tracker.test");
        let message = build_message("crm@tracker.test", &email).unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: jane@acme.test"));
        assert!(raw.contains("From: crm@tracker.test"));
        assert!(raw.contains("Reply-To: rep@tracker.test"));
        assert!(raw.contains("Subject: Renewal"));
        assert!(raw.contains("Hi Jane"));
    }

    #[test]
    fn test_html_message_is_multipart() {
        let mut email = Email::new("jane@acme.test", "Renewal", "Hi Jane");
        email.with_html("<p>Hi Jane</p>");
        let message = build_message("crm@tracker.test", &email).unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_invalid_address() {
        let email = Email::new("not an address", "Hi", "Body");
        let result = build_message("crm@tracker.test", &email);
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn test_no_recipients() {
        let mut email = Email::new("jane@acme.test", "Hi", "Body");
        email.to.clear();
        let result = build_message("crm@tracker.test", &email);
        assert!(matches!(result, Err(MailError::BuildEmail(_))));
    }
}
