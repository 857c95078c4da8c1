//! Best-effort notifications for sent and failed days.
//!
//! The [`Notifier`] facade dispatches to the configured ntfy topic, or does
//! nothing when notifications are not configured. Delivery failures are
//! returned to the caller, which logs them and carries on.

pub mod ntfy;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::config::NotificationConfig;
use crate::errors::NotificationError;
use crate::models::MenuImageRef;

/// What happened to the day's menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Sent,
    Failed,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyEvent {
    pub kind: EventKind,
    pub date: NaiveDate,
    pub message: String,
    /// Name of the delivered image file, for sent events.
    pub file_name: Option<String>,
}

impl NotifyEvent {
    pub fn sent(image: &MenuImageRef) -> Self {
        Self {
            kind: EventKind::Sent,
            date: image.date,
            message: format!("School menu for {} was emailed.", image.date),
            file_name: Some(image.file_name()),
        }
    }

    pub fn failed(date: NaiveDate, error: &str) -> Self {
        Self {
            kind: EventKind::Failed,
            date,
            message: format!("School menu for {} was not sent: {}", date, error),
            file_name: None,
        }
    }
}

/// Delivers [`NotifyEvent`]s to an external channel.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, event: &NotifyEvent) -> Result<(), NotificationError>;
}

/// Unified notifier over the configured channels.
pub struct Notifier {
    ntfy: Option<ntfy::NtfyNotifier>,
}

impl Notifier {
    /// Create a new notifier from the notification configuration.
    pub fn new(config: &NotificationConfig, viewer_base_url: &str) -> Self {
        let ntfy = config.is_enabled().then(|| {
            info!("ntfy notifications enabled");
            ntfy::NtfyNotifier::new(&config.ntfy_base_url, &config.ntfy_topic, viewer_base_url)
        });
        Self { ntfy }
    }

    /// Return whether any notification channel is configured.
    pub fn is_configured(&self) -> bool {
        self.ntfy.is_some()
    }
}

#[async_trait]
impl EventNotifier for Notifier {
    async fn notify(&self, event: &NotifyEvent) -> Result<(), NotificationError> {
        match self.ntfy {
            Some(ref ntfy) => ntfy.publish(event).await,
            None => Ok(()),
        }
    }
}
