//! Menu email delivery via SMTP.
//!
//! Uses the `lettre` crate to send one `multipart/related` message per day:
//! a plain-text / HTML alternative body plus the menu image attached inline
//! and referenced from the HTML as `cid:menu-image`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::message::header::{ContentDisposition, ContentId, ContentType};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use crate::config::{MailConfig, SmtpConfig};
use crate::errors::MailError;
use crate::models::{display_date, MenuImageRef};

/// Content-ID of the inline image part.
pub const IMAGE_CONTENT_ID: &str = "menu-image";

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends the daily menu email.
#[async_trait]
pub trait MenuMailer: Send + Sync {
    /// Deliver `image` to every configured recipient in one SMTP transaction.
    async fn send_menu(&self, image: &MenuImageRef) -> Result<(), MailError>;
}

/// SMTP mailer backed by an async `lettre` transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    viewer_base_url: String,
}

impl SmtpMailer {
    /// Create a mailer from the SMTP and mail sections of the config.
    pub fn from_config(smtp: &SmtpConfig, mail: &MailConfig) -> Result<Self, MailError> {
        let from: Mailbox = mail
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(mail.from.clone()))?;

        let recipients = mail
            .to
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .map_err(|_| MailError::InvalidAddress(addr.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            smtp = %format!("{}:{}", smtp.host, smtp.port),
            tls = smtp.use_tls,
            from = %mail.from,
            recipients = recipients.len(),
            "initializing SMTP mailer"
        );

        Ok(Self {
            transport: Self::build_transport(smtp)?,
            from,
            recipients,
            viewer_base_url: mail.viewer_base_url.clone(),
        })
    }

    /// Build the transport: implicit TLS on 465, STARTTLS otherwise, or
    /// plaintext when TLS is disabled.
    fn build_transport(
        smtp: &SmtpConfig,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let builder = if smtp.use_tls && smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| MailError::Transport(format!("SMTP TLS setup error: {}", e)))?
        } else if smtp.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| MailError::Transport(format!("SMTP STARTTLS setup error: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };

        let mut builder = builder.port(smtp.port).timeout(Some(SMTP_TIMEOUT));

        if !smtp.username.is_empty() {
            if smtp.password.is_none() {
                warn!("SMTP username is set but no password was resolved");
            }
            builder = builder.credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone().unwrap_or_default(),
            ));
        }

        Ok(builder.build())
    }

    /// Assemble the MIME message for `image` whose raw bytes are `image_bytes`.
    pub fn build_message(
        &self,
        image: &MenuImageRef,
        image_bytes: Vec<u8>,
    ) -> Result<Message, MailError> {
        let link = viewer_link(&self.viewer_base_url, image.date);

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(format_subject(image.date));
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }

        let content_type = ContentType::parse(image.content_type())
            .map_err(|e| MailError::Build(format!("invalid image content type: {}", e)))?;
        let image_part = SinglePart::builder()
            .header(content_type)
            .header(ContentDisposition::inline_with_name(&image.file_name()))
            .header(ContentId::from(format!("<{}>", IMAGE_CONTENT_ID)))
            .body(image_bytes);

        builder
            .multipart(
                MultiPart::related()
                    .multipart(MultiPart::alternative_plain_html(
                        format_text_body(image.date, link.as_deref()),
                        format_html_body(image.date, link.as_deref()),
                    ))
                    .singlepart(image_part),
            )
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl MenuMailer for SmtpMailer {
    async fn send_menu(&self, image: &MenuImageRef) -> Result<(), MailError> {
        debug!(path = %image.path.display(), to = self.recipients.len(), "sending menu email");

        let bytes = tokio::fs::read(&image.path)
            .await
            .map_err(|e| MailError::ImageRead {
                path: image.path.display().to_string(),
                detail: e.to_string(),
            })?;

        let message = self.build_message(image, bytes)?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!(date = %image.date, recipients = self.recipients.len(), "menu email sent");
                Ok(())
            }
            Err(e) => {
                warn!(date = %image.date, error = %e, "failed to send menu email");
                Err(MailError::Transport(e.to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `School menu – Tue 3 Feb`.
pub fn format_subject(date: NaiveDate) -> String {
    format!("School menu – {}", display_date(date))
}

/// Link to the calendar viewer for `date`, or `None` when no base URL is set.
///
/// `https://menus.example.com` becomes `https://menus.example.com/?date=...`;
/// a base with a path keeps it: `https://x.org/cal?date=...`.
pub fn viewer_link(base_url: &str, date: NaiveDate) -> Option<String> {
    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    let has_path = base
        .split_once("://")
        .map_or(base, |(_, rest)| rest)
        .contains('/');
    let sep = if has_path { "" } else { "/" };
    Some(format!("{}{}?date={}", base, sep, date.format("%Y-%m-%d")))
}

fn format_text_body(date: NaiveDate, link: Option<&str>) -> String {
    let mut text = format!("School menu for {} is attached.\n", date.format("%Y-%m-%d"));
    if let Some(link) = link {
        text.push_str(&format!("View in browser: {}\n", link));
    }
    text
}

fn format_html_body(date: NaiveDate, link: Option<&str>) -> String {
    let mut html = format!(
        "<html><body>\
         <img src=\"cid:{}\" alt=\"School menu\">\
         <p>School menu for {}.</p>",
        IMAGE_CONTENT_ID,
        html_escape(&display_date(date)),
    );
    if let Some(link) = link {
        html.push_str(&format!(
            "<p><a href=\"{}\">Open calendar view</a></p>",
            html_escape(link)
        ));
    }
    html.push_str("</body></html>");
    html
}

/// Minimal HTML escaping for configured strings.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
