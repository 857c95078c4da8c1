//! Domain model types shared by the scheduler, the mailer and the web API.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Day state machine
// ---------------------------------------------------------------------------

/// Where today's send sequence currently stands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    Idle,
    WaitingForSendTime,
    RetryingWithinWindow,
    Sent,
    GaveUp,
    SkippedWeekend,
}

impl DayState {
    /// Terminal states end automatic attempts until the next local day.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::GaveUp | Self::SkippedWeekend)
    }
}

impl std::fmt::Display for DayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::WaitingForSendTime => write!(f, "waiting_for_send_time"),
            Self::RetryingWithinWindow => write!(f, "retrying_within_window"),
            Self::Sent => write!(f, "sent"),
            Self::GaveUp => write!(f, "gave_up"),
            Self::SkippedWeekend => write!(f, "skipped_weekend"),
        }
    }
}

/// Result of the most recent attempt (or decision) for the day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pending,
    Sent,
    Failed,
    SkippedWeekend,
}

// ---------------------------------------------------------------------------
// Daily attempt state
// ---------------------------------------------------------------------------

/// The scheduler's record for one local calendar day.
#[derive(Debug, Clone)]
pub struct DailyAttemptState {
    pub date: NaiveDate,
    pub state: DayState,
    pub attempts: u32,
    pub first_attempt_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub last_outcome: Outcome,
    pub last_error: Option<String>,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub in_flight: bool,
}

impl DailyAttemptState {
    /// A fresh record for `date`, as at process start or after rollover.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            state: DayState::Idle,
            attempts: 0,
            first_attempt_at: None,
            last_attempt_at: None,
            last_sent_at: None,
            last_outcome: Outcome::Pending,
            last_error: None,
            last_scan_at: None,
            in_flight: false,
        }
    }
}

/// Read-only copy of [`DailyAttemptState`] served by `/status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub date: NaiveDate,
    pub state: DayState,
    pub last_outcome: Outcome,
    pub last_scan_timestamp: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub attempts: u32,
    pub first_attempt_at: Option<DateTime<Utc>>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub attempt_in_flight: bool,
    pub timezone: String,
    pub send_time: String,
}

// ---------------------------------------------------------------------------
// Menu image
// ---------------------------------------------------------------------------

/// A menu image found on disk for a given date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuImageRef {
    pub path: PathBuf,
    pub date: NaiveDate,
}

impl MenuImageRef {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("menu-{}.png", self.date))
    }

    /// MIME type derived from the file extension.
    pub fn content_type(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            _ => "image/png",
        }
    }
}

// ---------------------------------------------------------------------------
// Manual trigger
// ---------------------------------------------------------------------------

/// How a manual `/send-now` attempt ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ManualStatus {
    Sent,
    NotFound,
    Failed,
    AlreadySent,
}

/// Response body for a manual attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManualOutcome {
    pub status: ManualStatus,
    pub date: NaiveDate,
    pub detail: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Date formatting
// ---------------------------------------------------------------------------

/// `Tue 3 Feb` style date used in subjects and notification titles.
pub fn display_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.format("%a"), date.day(), date.format("%b"))
}
