//! Mailer double that records deliveries and fails on demand.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{Mailer, MailerError, OutgoingEmail};

use super::lock;

#[derive(Debug, Default)]
struct State {
    sent: Vec<OutgoingEmail>,
    failures_left: usize,
    attempts: usize,
}

/// Records every email it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    state: Mutex<State>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose first `count` sends fail with a transport error.
    pub fn failing(count: usize) -> Self {
        let mailer = Self::default();
        lock(&mailer.state).failures_left = count;
        mailer
    }

    /// Successfully delivered emails, oldest first.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        lock(&self.state).sent.clone()
    }

    /// Every send attempt, including failures.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let mut state = lock(&self.state);
        state.attempts += 1;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(MailerError::transport("relay refused connection"));
        }
        state.sent.push(email.clone());
        Ok(())
    }
}
