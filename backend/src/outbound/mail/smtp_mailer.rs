//! SMTP mail transport built on `lettre`.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use zeroize::Zeroizing;

use crate::domain::ports::{Mailer, MailerError, OutgoingEmail};

/// Connection settings for [`SmtpMailer`].
#[derive(Debug, Clone)]
pub struct SmtpMailerConfig {
    /// Relay host name.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Optional username and password.
    pub credentials: Option<(String, Zeroizing<String>)>,
    /// Sender mailbox, e.g. `WhenWorks <no-reply@example.com>`.
    pub from: String,
    /// Per-command network timeout.
    pub timeout: Duration,
    /// Upgrade the connection with STARTTLS.
    pub starttls: bool,
}

/// Sends HTML email through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    /// Returns [`MailerError::Address`] for an unparsable sender and
    /// [`MailerError::Transport`] when TLS parameters cannot be built.
    pub fn new(config: SmtpMailerConfig) -> Result<Self, MailerError> {
        let from = parse_mailbox(&config.from)?;
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|err| MailerError::transport(err.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host)
        };
        builder = builder.port(config.port).timeout(Some(config.timeout));
        if let Some((username, password)) = config.credentials {
            builder = builder.credentials(Credentials::new(username, password.to_string()));
        }
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

fn parse_mailbox(value: &str) -> Result<Mailbox, MailerError> {
    value
        .parse::<Mailbox>()
        .map_err(|err| MailerError::address(format!("{value}: {err}")))
}

fn build_message(from: &Mailbox, email: &OutgoingEmail) -> Result<Message, MailerError> {
    let to = parse_mailbox(email.to.as_str())?;
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(email.html_body.clone())
        .map_err(|err| MailerError::build(err.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let message = build_message(&self.from, email)?;
        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|err| MailerError::transport(err.to_string()))
    }
}
