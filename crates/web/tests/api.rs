//! In-process tests for the status server routes.
//!
//! The router is driven with `tower::ServiceExt::oneshot`; the scheduler
//! behind it uses a manual clock, a tempdir of menu images and a recording
//! mailer instead of SMTP.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Notify;
use tower::ServiceExt;

use menumailer_core::clock::ManualClock;
use menumailer_core::errors::{MailError, NotificationError};
use menumailer_core::locator::ImageLocator;
use menumailer_core::mailer::MenuMailer;
use menumailer_core::models::MenuImageRef;
use menumailer_core::notify::{EventNotifier, NotifyEvent};
use menumailer_core::scheduler::{MenuScheduler, ScheduleSettings};
use menumailer_web::WebServer;

// ===========================================================================
// Helpers
// ===========================================================================

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<u32>,
}

#[async_trait]
impl MenuMailer for RecordingMailer {
    async fn send_menu(&self, _image: &MenuImageRef) -> Result<(), MailError> {
        *self.sent.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
struct BlockingMailer {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl MenuMailer for BlockingMailer {
    async fn send_menu(&self, _image: &MenuImageRef) -> Result<(), MailError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<NotifyEvent>>,
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn notify(&self, event: &NotifyEvent) -> Result<(), NotificationError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn london(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    chrono_tz::Europe::London
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn publish_menu(dir: &TempDir, y: i32, m: u32, d: u32) {
    let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
    std::fs::write(dir.path().join(ImageLocator::expected_file_name(date)), b"png").unwrap();
}

fn scheduler(
    dir: &TempDir,
    clock: Arc<ManualClock>,
    mailer: Arc<dyn MenuMailer>,
    notifier: Arc<dyn EventNotifier>,
) -> Arc<MenuScheduler> {
    let settings = ScheduleSettings {
        tz: chrono_tz::Europe::London,
        send_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
        skip_weekends: true,
        retry_window: Duration::minutes(60),
    };
    Arc::new(MenuScheduler::new(
        settings,
        ImageLocator::new(dir.path()),
        mailer,
        notifier,
        clock,
    ))
}

async fn call(server: &WebServer, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = server
        .router()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn test_health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(london(2026, 2, 3, 6, 0)));
    let server = WebServer::new(scheduler(
        &dir,
        clock,
        Arc::new(RecordingMailer::default()),
        Arc::new(RecordingNotifier::default()),
    ));

    let (status, body) = call(&server, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_tracks_retry_then_sent() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(london(2026, 2, 3, 7, 0)));
    let sched = scheduler(
        &dir,
        clock.clone(),
        Arc::new(RecordingMailer::default()),
        Arc::new(RecordingNotifier::default()),
    );
    let server = WebServer::new(sched.clone());

    let (status, body) = call(&server, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["date"], "2026-02-03");
    assert!(body["lastScanTimestamp"].is_null());

    // 07:00 .. 07:40 without an image.
    for _ in 0..9 {
        sched.tick().await;
        clock.advance(Duration::minutes(5));
    }
    let (_, body) = call(&server, "GET", "/status").await;
    assert_eq!(body["state"], "retrying_within_window");
    assert_eq!(body["lastOutcome"], "pending");
    assert!(body["lastScanTimestamp"].is_string());
    assert!(body["lastError"].as_str().unwrap().contains("not found"));

    // 07:45 the image shows up.
    publish_menu(&dir, 2026, 2, 3);
    sched.tick().await;
    let (_, body) = call(&server, "GET", "/status").await;
    assert_eq!(body["state"], "sent");
    assert_eq!(body["lastOutcome"], "sent");
    assert!(body["lastError"].is_null());
    assert_eq!(body["attempts"], 10);
}

#[tokio::test]
async fn test_status_reports_gave_up() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(london(2026, 2, 3, 7, 0)));
    let notifier = Arc::new(RecordingNotifier::default());
    let sched = scheduler(
        &dir,
        clock.clone(),
        Arc::new(RecordingMailer::default()),
        notifier.clone(),
    );
    let server = WebServer::new(sched.clone());

    sched.tick().await;
    clock.advance(Duration::minutes(60));
    sched.tick().await;

    let (_, body) = call(&server, "GET", "/status").await;
    assert_eq!(body["state"], "gave_up");
    assert_eq!(body["lastOutcome"], "failed");
    assert!(!body["lastError"].as_str().unwrap().is_empty());
    assert_eq!(notifier.events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_send_now_sends_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    publish_menu(&dir, 2026, 2, 7);
    // Saturday with weekend skipping on: the manual trigger still sends.
    let clock = Arc::new(ManualClock::new(london(2026, 2, 7, 10, 0)));
    let mailer = Arc::new(RecordingMailer::default());
    let sched = scheduler(
        &dir,
        clock,
        mailer.clone(),
        Arc::new(RecordingNotifier::default()),
    );
    let server = WebServer::new(sched.clone());
    sched.tick().await;

    let (status, body) = call(&server, "POST", "/send-now").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");
    assert_eq!(body["date"], "2026-02-07");
    assert!(body["sentAt"].is_string());
    assert_eq!(*mailer.sent.lock().unwrap(), 1);

    let (status, body) = call(&server, "POST", "/send-now").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_sent");
    assert_eq!(*mailer.sent.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_send_now_without_image() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(london(2026, 2, 3, 9, 0)));
    let server = WebServer::new(scheduler(
        &dir,
        clock,
        Arc::new(RecordingMailer::default()),
        Arc::new(RecordingNotifier::default()),
    ));

    let (status, body) = call(&server, "POST", "/send-now").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_found");
    assert!(body["detail"].as_str().unwrap().contains("2026-02-03"));
}

#[tokio::test]
async fn test_send_now_conflicts_while_in_flight() {
    let dir = tempfile::tempdir().unwrap();
    publish_menu(&dir, 2026, 2, 3);
    let clock = Arc::new(ManualClock::new(london(2026, 2, 3, 7, 30)));
    let mailer = Arc::new(BlockingMailer::default());
    let sched = scheduler(
        &dir,
        clock,
        mailer.clone(),
        Arc::new(RecordingNotifier::default()),
    );
    let server = Arc::new(WebServer::new(sched.clone()));

    let first = {
        let server = server.clone();
        tokio::spawn(async move { call(&server, "POST", "/send-now").await })
    };
    mailer.started.notified().await;

    let (status, body) = call(&server, "POST", "/send-now").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already in progress"));

    let (_, snapshot) = call(&server, "GET", "/status").await;
    assert_eq!(snapshot["attemptInFlight"], true);

    mailer.release.notify_one();
    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(london(2026, 2, 3, 6, 0)));
    let server = WebServer::new(scheduler(
        &dir,
        clock,
        Arc::new(RecordingMailer::default()),
        Arc::new(RecordingNotifier::default()),
    ));

    let (status, body) = call(&server, "GET", "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("/nope"));
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(london(2026, 2, 3, 6, 0)));
    let mailer = Arc::new(RecordingMailer::default());
    let server = WebServer::new(scheduler(
        &dir,
        clock,
        mailer.clone(),
        Arc::new(RecordingNotifier::default()),
    ));

    let (status, _) = call(&server, "GET", "/send-now").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(*mailer.sent.lock().unwrap(), 0);
}
