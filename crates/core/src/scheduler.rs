//! Daily send scheduler.
//!
//! [`MenuScheduler`] owns the day's [`DailyAttemptState`] and is the only
//! component that changes it. Each call to [`MenuScheduler::tick`] evaluates
//! the state machine once:
//!
//! ```text
//! Idle ──▶ WaitingForSendTime ──▶ RetryingWithinWindow ──▶ Sent
//!                 │                        │
//!                 ▼                        ▼
//!           SkippedWeekend              GaveUp
//! ```
//!
//! A change of local date resets the record to `Idle` whatever state it was
//! in. [`MenuScheduler::send_now`] runs one attempt immediately, bypassing
//! the schedule. Both paths share the attempt-in-flight flag, which is
//! checked and set under the same lock as the rest of the record, so two
//! attempts never run at once.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::{AppConfig, ScheduleConfig};
use crate::errors::{AttemptError, ConfigError, SchedulerError};
use crate::locator::ImageLocator;
use crate::mailer::MenuMailer;
use crate::models::{
    DailyAttemptState, DayState, ManualOutcome, ManualStatus, MenuImageRef, Outcome,
    StatusSnapshot,
};
use crate::notify::{EventNotifier, NotifyEvent};

/// Minimum gap between two "image not found yet" info lines.
const MISSING_LOG_INTERVAL_SECS: i64 = 300;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Parsed, validated schedule settings.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    pub tz: Tz,
    pub send_time: NaiveTime,
    pub skip_weekends: bool,
    pub retry_window: chrono::Duration,
}

impl ScheduleSettings {
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            tz: config.tz()?,
            send_time: config.send_time()?,
            skip_weekends: config.skip_weekends,
            retry_window: config.retry_window()?,
        })
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Clears the in-flight flag when an attempt ends, including when the
/// attempt future is dropped half-way.
struct InFlightGuard<'a> {
    state: &'a Mutex<DailyAttemptState>,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(state: &'a Mutex<DailyAttemptState>) -> Self {
        Self { state, armed: true }
    }

    fn release(mut self, st: &mut DailyAttemptState) {
        st.in_flight = false;
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock_recover(self.state).in_flight = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// The daily send scheduler.
pub struct MenuScheduler {
    settings: ScheduleSettings,
    locator: ImageLocator,
    mailer: Arc<dyn MenuMailer>,
    notifier: Arc<dyn EventNotifier>,
    clock: Arc<dyn Clock>,
    state: Mutex<DailyAttemptState>,
    missing_logged_at: Mutex<Option<DateTime<Utc>>>,
}

impl MenuScheduler {
    pub fn new(
        settings: ScheduleSettings,
        locator: ImageLocator,
        mailer: Arc<dyn MenuMailer>,
        notifier: Arc<dyn EventNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let today = clock.now().with_timezone(&settings.tz).date_naive();
        info!(
            date = %today,
            timezone = %settings.tz.name(),
            send_time = %settings.send_time.format("%H:%M"),
            skip_weekends = settings.skip_weekends,
            retry_window_mins = settings.retry_window.num_minutes(),
            "initializing menu scheduler"
        );
        Self {
            settings,
            locator,
            mailer,
            notifier,
            clock,
            state: Mutex::new(DailyAttemptState::new(today)),
            missing_logged_at: Mutex::new(None),
        }
    }

    /// Build a scheduler from the application config.
    pub fn from_config(
        config: &AppConfig,
        mailer: Arc<dyn MenuMailer>,
        notifier: Arc<dyn EventNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            ScheduleSettings::from_config(&config.schedule)?,
            ImageLocator::new(&config.menu.image_dir),
            mailer,
            notifier,
            clock,
        ))
    }

    /// Copy of the current record for the status API.
    pub fn snapshot(&self) -> StatusSnapshot {
        let st = lock_recover(&self.state);
        StatusSnapshot {
            date: st.date,
            state: st.state,
            last_outcome: st.last_outcome,
            last_scan_timestamp: st.last_scan_at,
            last_error: st.last_error.clone(),
            attempts: st.attempts,
            first_attempt_at: st.first_attempt_at,
            last_attempt_at: st.last_attempt_at,
            last_sent_at: st.last_sent_at,
            attempt_in_flight: st.in_flight,
            timezone: self.settings.tz.name().to_string(),
            send_time: self.settings.send_time.format("%H:%M").to_string(),
        }
    }

    fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.settings.tz).date_naive()
    }

    /// Reset the record when the local date has moved on. Returns whether a
    /// reset happened.
    fn roll_over(&self, st: &mut DailyAttemptState, today: NaiveDate) -> bool {
        if st.date == today {
            return false;
        }
        info!(
            previous_date = %st.date,
            previous_state = %st.state,
            date = %today,
            "local day changed, resetting daily state"
        );
        let in_flight = st.in_flight;
        let last_scan_at = st.last_scan_at;
        *st = DailyAttemptState::new(today);
        st.in_flight = in_flight;
        st.last_scan_at = last_scan_at;
        true
    }

    /// UTC instant at which the send time falls on `date`, if it exists in
    /// the local timezone (it may not on a DST gap).
    fn send_start(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.settings
            .tz
            .from_local_datetime(&date.and_time(self.settings.send_time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Whether the retry window for `date` has closed at `at`. The window
    /// ends at send time + window; when the send time does not exist that
    /// day (DST gap) it is measured from the first attempt instead.
    fn window_closed(
        &self,
        date: NaiveDate,
        first_attempt: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> bool {
        match self.send_start(date) {
            Some(start) => at >= start + self.settings.retry_window,
            None => at - first_attempt >= self.settings.retry_window,
        }
    }

    // -----------------------------------------------------------------------
    // Scheduled path
    // -----------------------------------------------------------------------

    /// Evaluate the state machine once and return the resulting state.
    ///
    /// Called by the timer loop once per scan interval. A tick that notices a
    /// new local date only performs the reset; the next tick starts the new
    /// day's sequence.
    pub async fn tick(&self) -> DayState {
        let now = self.clock.now();
        let local = now.with_timezone(&self.settings.tz);
        let today = local.date_naive();

        {
            let mut st = lock_recover(&self.state);
            if self.roll_over(&mut st, today) {
                return st.state;
            }

            if st.state == DayState::Idle {
                st.state = DayState::WaitingForSendTime;
                debug!(date = %today, "waiting for send time");
            }

            if st.state.is_terminal() {
                return st.state;
            }

            if st.state == DayState::WaitingForSendTime {
                if self.settings.skip_weekends && is_weekend(today) {
                    info!(date = %today, "skipping weekend send");
                    st.state = DayState::SkippedWeekend;
                    st.last_outcome = Outcome::SkippedWeekend;
                    return st.state;
                }

                if local.time() < self.settings.send_time {
                    return st.state;
                }

                if let Some(start) = self.send_start(today) {
                    let deadline = start + self.settings.retry_window;
                    if now > deadline {
                        warn!(
                            date = %today,
                            deadline = %deadline.with_timezone(&self.settings.tz).to_rfc3339(),
                            "send window missed"
                        );
                        st.state = DayState::GaveUp;
                        st.last_outcome = Outcome::Failed;
                        st.last_error = Some(format!(
                            "send window missed: first evaluation after deadline {}",
                            deadline.with_timezone(&self.settings.tz).to_rfc3339()
                        ));
                        return st.state;
                    }
                }

                info!(date = %today, "send time reached, starting attempts");
                st.state = DayState::RetryingWithinWindow;
            }

            if st.in_flight {
                debug!(date = %today, "attempt already in flight, skipping tick");
                return st.state;
            }

            st.in_flight = true;
            st.attempts += 1;
            st.first_attempt_at.get_or_insert(now);
            st.last_attempt_at = Some(now);
        }

        let guard = InFlightGuard::new(&self.state);
        let result = self.attempt(today).await;
        let finished = self.clock.now();

        let (state, event) = {
            let mut st = lock_recover(&self.state);
            guard.release(&mut st);

            if st.date != today {
                debug!(date = %today, "day changed during attempt, discarding result");
                return st.state;
            }

            let attempts = st.attempts;
            match result {
                Ok(image) => {
                    info!(date = %today, attempts, "menu delivered");
                    st.state = DayState::Sent;
                    st.last_outcome = Outcome::Sent;
                    st.last_error = None;
                    st.last_sent_at = Some(finished);
                    (st.state, Some(NotifyEvent::sent(&image)))
                }
                Err(err) => {
                    let message = err.to_string();
                    st.last_error = Some(message.clone());

                    if self.window_closed(today, st.first_attempt_at.unwrap_or(now), finished) {
                        error!(
                            date = %today,
                            attempts,
                            error = %message,
                            "retry window exhausted, giving up for today"
                        );
                        st.state = DayState::GaveUp;
                        st.last_outcome = Outcome::Failed;
                        (st.state, Some(NotifyEvent::failed(today, &message)))
                    } else {
                        st.last_outcome = Outcome::Pending;
                        (st.state, None)
                    }
                }
            }
        };

        if let Some(event) = event {
            self.dispatch(event).await;
        }
        state
    }

    // -----------------------------------------------------------------------
    // Manual path
    // -----------------------------------------------------------------------

    /// Run one attempt for today right now.
    ///
    /// Bypasses the send time, the weekend skip and a given-up day. Refuses
    /// to run while another attempt is in flight and does not send twice on
    /// a day that is already `Sent`. A failed manual attempt records its
    /// error but leaves the day's state and retry window untouched.
    pub async fn send_now(&self) -> Result<ManualOutcome, SchedulerError> {
        let now = self.clock.now();
        let today = self.local_today(now);

        {
            let mut st = lock_recover(&self.state);
            self.roll_over(&mut st, today);

            if st.in_flight {
                warn!(date = %today, "manual send rejected: attempt already in flight");
                return Err(SchedulerError::AttemptInFlight { date: today });
            }

            if st.state == DayState::Sent {
                info!(date = %today, "manual send skipped: menu already sent today");
                return Ok(ManualOutcome {
                    status: ManualStatus::AlreadySent,
                    date: today,
                    detail: Some("menu already sent today".into()),
                    sent_at: st.last_sent_at,
                });
            }

            st.in_flight = true;
            st.attempts += 1;
            st.last_attempt_at = Some(now);
        }

        info!(date = %today, "manual send requested");
        let guard = InFlightGuard::new(&self.state);
        let result = self.attempt(today).await;
        let finished = self.clock.now();

        let (outcome, event) = {
            let mut st = lock_recover(&self.state);
            guard.release(&mut st);
            let same_day = st.date == today;

            match result {
                Ok(image) => {
                    if same_day {
                        st.state = DayState::Sent;
                        st.last_outcome = Outcome::Sent;
                        st.last_error = None;
                        st.last_sent_at = Some(finished);
                    }
                    let outcome = ManualOutcome {
                        status: ManualStatus::Sent,
                        date: today,
                        detail: None,
                        sent_at: Some(finished),
                    };
                    (outcome, Some(NotifyEvent::sent(&image)))
                }
                Err(err) => {
                    let message = err.to_string();
                    if same_day {
                        st.last_error = Some(message.clone());
                    }
                    let status = match err {
                        AttemptError::NotFoundYet { .. } => ManualStatus::NotFound,
                        _ => ManualStatus::Failed,
                    };
                    let outcome = ManualOutcome {
                        status,
                        date: today,
                        detail: Some(message),
                        sent_at: None,
                    };
                    (outcome, None)
                }
            }
        };

        if let Some(event) = event {
            self.dispatch(event).await;
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Shared attempt logic
    // -----------------------------------------------------------------------

    /// Locate today's image and mail it. Returns the image that was sent.
    async fn attempt(&self, date: NaiveDate) -> Result<MenuImageRef, AttemptError> {
        let found = self.locator.locate(date).await;
        let scanned_at = self.clock.now();
        lock_recover(&self.state).last_scan_at = Some(scanned_at);

        let result = match found {
            Ok(Some(image)) => {
                debug!(date = %date, path = %image.path.display(), "menu image found");
                self.mailer
                    .send_menu(&image)
                    .await
                    .map(|()| image)
                    .map_err(AttemptError::from)
            }
            Ok(None) => Err(AttemptError::NotFoundYet { date }),
            Err(err) => Err(err),
        };

        if let Err(ref err) = result {
            self.log_attempt_error(date, err, scanned_at);
        }
        result
    }

    fn log_attempt_error(&self, date: NaiveDate, err: &AttemptError, at: DateTime<Utc>) {
        match err {
            AttemptError::NotFoundYet { .. } => {
                let mut last = lock_recover(&self.missing_logged_at);
                let due = last.map_or(true, |prev| {
                    (at - prev).num_seconds() >= MISSING_LOG_INTERVAL_SECS
                });
                if due {
                    info!(
                        date = %date,
                        kind = err.kind(),
                        expected = %ImageLocator::expected_file_name(date),
                        dir = %self.locator.dir().display(),
                        "menu image not found, will retry"
                    );
                    *last = Some(at);
                }
            }
            AttemptError::DirectoryUnavailable { .. } => {
                error!(
                    date = %date,
                    kind = err.kind(),
                    error = %err,
                    "menu image directory unavailable"
                );
            }
            AttemptError::Transport(_) => {
                warn!(
                    date = %date,
                    kind = err.kind(),
                    error = %err,
                    "menu email delivery failed"
                );
            }
        }
    }

    async fn dispatch(&self, event: NotifyEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            warn!(kind = %event.kind, date = %event.date, error = %e, "notification failed");
        }
    }
}
