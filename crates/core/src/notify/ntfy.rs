//! ntfy notification sender.
//!
//! Publishes a message to `<base_url>/<topic>` with ntfy's header-based
//! metadata (`Title`, `Tags`, `Priority`, `Click`, `Attach`, `Filename`).

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{EventKind, NotifyEvent};
use crate::errors::NotificationError;
use crate::mailer::viewer_link;
use crate::models::display_date;

const NTFY_TIMEOUT: Duration = Duration::from_secs(10);

/// ntfy topic publisher.
pub struct NtfyNotifier {
    topic_url: String,
    viewer_base_url: String,
    http: reqwest::Client,
}

impl NtfyNotifier {
    /// Create a notifier publishing to `topic` on the ntfy server at `base_url`.
    pub fn new(base_url: &str, topic: &str, viewer_base_url: &str) -> Self {
        let topic_url = format!(
            "{}/{}",
            base_url.trim().trim_end_matches('/'),
            topic.trim().trim_start_matches('/')
        );
        info!(url = %topic_url, "initializing ntfy notifier");
        Self {
            topic_url,
            viewer_base_url: viewer_base_url.trim().trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .timeout(NTFY_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn topic_url(&self) -> &str {
        &self.topic_url
    }

    /// Header set for `event`, in the order they are sent.
    pub fn headers_for(&self, event: &NotifyEvent) -> Vec<(&'static str, String)> {
        let display = display_date(event.date);
        let mut headers = Vec::new();

        match event.kind {
            EventKind::Sent => {
                headers.push(("Title", format!("School menu - {}", display)));
                headers.push(("Tags", "white_check_mark".to_string()));
                if let Some(link) = viewer_link(&self.viewer_base_url, event.date) {
                    headers.push(("Click", link));
                }
                if !self.viewer_base_url.is_empty() {
                    headers.push((
                        "Attach",
                        format!("{}/api/image/{}", self.viewer_base_url, event.date),
                    ));
                    let file_name = event
                        .file_name
                        .clone()
                        .unwrap_or_else(|| format!("menu-{}.png", event.date));
                    headers.push(("Filename", file_name));
                }
            }
            EventKind::Failed => {
                headers.push(("Title", format!("School menu failed - {}", display)));
                headers.push(("Tags", "warning".to_string()));
                headers.push(("Priority", "high".to_string()));
            }
        }

        headers
    }

    /// Publish `event` to the topic.
    pub async fn publish(&self, event: &NotifyEvent) -> Result<(), NotificationError> {
        debug!(kind = %event.kind, date = %event.date, "publishing ntfy message");

        let mut request = self
            .http
            .post(&self.topic_url)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(event.message.clone());
        for (name, value) in self.headers_for(event) {
            request = request.header(name, value);
        }

        let resp = request.send().await.map_err(NotificationError::HttpError)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "ntfy returned error");
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(kind = %event.kind, "ntfy message published");
        Ok(())
    }
}
