//! Driven port for outbound email delivery.

use async_trait::async_trait;

use crate::domain::EmailAddress;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mail transports.
    pub enum MailerError {
        /// Sender or recipient address was rejected.
        Address { message: String } => "invalid email address: {message}",
        /// Message could not be assembled.
        Build { message: String } => "failed to build email: {message}",
        /// Transport refused or failed to deliver the message.
        Transport { message: String } => "failed to send email: {message}",
    }
}

/// Fully rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Destination address.
    pub to: EmailAddress,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

/// Sends rendered email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver `email`.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError>;
}
