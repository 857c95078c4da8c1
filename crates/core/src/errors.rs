//! Error types for the menu-mailer core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use chrono::NaiveDate;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Attempt(#[from] AttemptError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

// ---------------------------------------------------------------------------
// Attempt errors
// ---------------------------------------------------------------------------

/// Why a single send attempt did not deliver the menu.
///
/// Every variant is retryable until the day's retry window runs out.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    /// No image for the date exists yet. Expected before the menu is published.
    #[error("menu image not found for {date}")]
    NotFoundYet { date: NaiveDate },

    /// The image directory could not be listed or the image could not be read.
    #[error("menu image directory unavailable at '{path}': {detail}")]
    DirectoryUnavailable { path: String, detail: String },

    /// SMTP delivery failed.
    #[error("mail transport error: {0}")]
    Transport(String),
}

impl AttemptError {
    /// Short machine-readable kind, recorded as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFoundYet { .. } => "not_found",
            Self::DirectoryUnavailable { .. } => "directory_unavailable",
            Self::Transport(_) => "transport",
        }
    }
}

impl From<MailError> for AttemptError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::ImageRead { path, detail } => Self::DirectoryUnavailable { path, detail },
            other => Self::Transport(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// An environment variable holds a value that cannot be parsed.
    #[error("environment variable '{var}' has invalid value '{value}': {detail}")]
    InvalidEnvVar {
        var: String,
        value: String,
        detail: String,
    },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Mail errors
// ---------------------------------------------------------------------------

/// Errors from building or delivering the menu email.
#[derive(Debug, Error)]
pub enum MailError {
    /// A sender or recipient address could not be parsed.
    #[error("invalid email address '{0}'")]
    InvalidAddress(String),

    /// The MIME message could not be assembled.
    #[error("failed to build email: {0}")]
    Build(String),

    /// The image file could not be read.
    #[error("failed to read menu image '{path}': {detail}")]
    ImageRead { path: String, detail: String },

    /// Connection, authentication or delivery failure.
    #[error("SMTP error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Errors from the ntfy notification channel.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// HTTP error during notification delivery.
    #[error("notification HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The ntfy server answered with a non-success status.
    #[error("ntfy returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

/// Errors returned by the scheduler's manual trigger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Another attempt (scheduled or manual) is still running.
    #[error("a send attempt for {date} is already in progress")]
    AttemptInFlight { date: NaiveDate },
}
