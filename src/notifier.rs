use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{config::AppConfig, repository::RepositoryState};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no email address on record for user {0}")]
    UnknownRecipient(Uuid),
    #[error("recipient lookup failed: {0}")]
    Lookup(String),
    #[error("mail relay rejected the message: {0}")]
    Rejected(String),
    #[error("mail relay unreachable: {0}")]
    Transport(String),
}

/// Notifier
///
/// The Notification Sender contract. Delivery is best-effort: callers log a
/// failure and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user_id: Uuid, subject: &str, body: &str) -> Result<(), NotifyError>;
}

pub type NotifierState = Arc<dyn Notifier>;

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// HttpMailRelay
///
/// Resolves the recipient through the Credential Store and hands the message to
/// an HTTP email relay as JSON.
pub struct HttpMailRelay {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
    users: RepositoryState,
}

impl HttpMailRelay {
    pub fn new(config: &AppConfig, users: RepositoryState) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.mail_relay_url.clone(),
            api_key: config.mail_relay_key.clone(),
            from: config.mail_from.clone(),
            users,
        }
    }
}

#[async_trait]
impl Notifier for HttpMailRelay {
    async fn send(&self, user_id: Uuid, subject: &str, body: &str) -> Result<(), NotifyError> {
        let recipient = self
            .users
            .get_user(user_id)
            .await
            .map_err(|e| NotifyError::Lookup(e.to_string()))?
            .filter(|user| !user.email.is_empty())
            .ok_or(NotifyError::UnknownRecipient(user_id))?;

        let message = RelayMessage {
            from: &self.from,
            to: &recipient.email,
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().to_string()));
        }

        tracing::info!(to = %recipient.email, %subject, "notification sent");
        Ok(())
    }
}

/// A delivery recorded by `MockNotifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub user_id: Uuid,
    pub subject: String,
    pub body: String,
}

/// MockNotifier
///
/// Records every send attempt; with `should_fail` each attempt errors after
/// being recorded. Clones share the log.
#[derive(Clone, Default)]
pub struct MockNotifier {
    pub should_fail: bool,
    sent: Arc<Mutex<Vec<SentNotification>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, user_id: Uuid, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().await.push(SentNotification {
            user_id,
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.should_fail {
            return Err(NotifyError::Transport("mock relay down".to_string()));
        }
        Ok(())
    }
}
