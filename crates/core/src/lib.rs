//! menu-mailer core library.
//!
//! This crate provides the building blocks of the daily menu mailer:
//! configuration, menu image lookup, SMTP delivery, ntfy notifications and
//! the scheduler that ties them together once per local day.

pub mod clock;
pub mod config;
pub mod errors;
pub mod locator;
pub mod mailer;
pub mod models;
pub mod notify;
pub mod scheduler;

// Re-exports for convenience.
pub use clock::{Clock, SystemClock};
pub use config::AppConfig;
pub use locator::ImageLocator;
pub use mailer::{MenuMailer, SmtpMailer};
pub use notify::{EventNotifier, Notifier};
pub use scheduler::MenuScheduler;
