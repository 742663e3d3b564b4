//! Command flow acceptance tests.
//!
//! Commands posted over HTTP land in the shared mailbox, are applied by a
//! tick, and come back out through the snapshot endpoint.
//!
//! # Acceptance Criteria
//!
//! - Valid commands answer 200 and are applied on the next tick
//! - Invalid commands answer 400 and never reach the clock
//! - A later command of the same kind replaces an unconsumed earlier one
//! - Readers see defaults before the first publish, then whole snapshots

use super::common::{assert_angle, request, wall};
use axum::http::{Method, StatusCode};
use clock_common::config::WebConfig;
use clock_common::mailbox::CommandMailbox;
use clock_common::snapshot::ClockSnapshot;
use clock_core::{ClockState, WallTime};
use clock_web::{StateUpdater, WebServer};
use std::sync::Arc;

/// Minimal stand-in for the daemon's tick step.
struct Harness {
    server: WebServer,
    mailbox: Arc<CommandMailbox>,
    updater: StateUpdater,
    clock: ClockState,
    now: WallTime,
}

impl Harness {
    fn new() -> Self {
        let mailbox = Arc::new(CommandMailbox::new());
        let server = WebServer::new(WebConfig::default(), Arc::clone(&mailbox));
        let updater = server.state_updater();
        Self {
            server,
            mailbox,
            updater,
            clock: ClockState::new(),
            now: wall(7, 30, 0),
        }
    }

    fn step(&mut self) -> ClockSnapshot {
        for command in self.mailbox.take_pending() {
            let _ = self.clock.apply_command(&command, self.now);
        }
        self.clock.tick();
        let snapshot = self.clock.snapshot(self.now);
        self.updater.publish(snapshot);
        snapshot
    }

    async fn post(&self, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        request(self.server.router(), Method::POST, uri, body).await
    }

    async fn published(&self) -> ClockSnapshot {
        let (status, body) = request(self.server.router(), Method::GET, "/clock_data.json", "").await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_value(body).unwrap()
    }
}

#[tokio::test]
async fn defaults_before_first_publish() {
    let harness = Harness::new();
    assert_eq!(harness.published().await, ClockSnapshot::default());
}

#[tokio::test]
async fn set_time_applied_on_next_tick() {
    let mut harness = Harness::new();
    let (status, body) = harness
        .post("/set_time", r#"{"hour": 14, "minute": 59, "second": 59}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");

    // Not applied until the loop runs
    assert_eq!(harness.clock.time(), (0, 0, 0));

    harness.step();
    let published = harness.published().await;
    assert_eq!(
        (
            published.current_hour,
            published.current_minute,
            published.current_second
        ),
        (3, 0, 0)
    );
    assert_angle(published.hour_angle, 90.0);
    assert_angle(published.minute_angle, 0.0);
}

#[tokio::test]
async fn alarm_rings_at_wall_clock_minute() {
    let mut harness = Harness::new();
    let (status, _) = harness
        .post("/set_alarm", r#"{"hora": 7, "minuto": 30}"#)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(harness.step().alarm_active);
    assert!(harness.published().await.alarm_active);

    harness.post("/clear_alarm", "").await;
    harness.step();
    assert!(!harness.published().await.alarm_active);
}

#[tokio::test]
async fn rejected_commands_never_reach_clock() {
    let mut harness = Harness::new();

    let (status, body) = harness.post("/set_alarm", r#"{"hour": 24, "minute": 0}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid hour or minute");

    let (status, body) = harness.post("/set_time", "{").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid JSON");

    let (status, body) = harness
        .post("/set_time", r#"{"hour": 1, "minute": 60, "second": 0}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid time values");

    harness.step();
    assert_eq!(harness.clock.time(), (0, 0, 1));
    assert!(harness.clock.alarm().is_none());
}

#[tokio::test]
async fn later_command_of_same_kind_wins() {
    let mut harness = Harness::new();
    harness
        .post("/set_time", r#"{"hour": 1, "minute": 0, "second": 0}"#)
        .await;
    harness
        .post("/set_time", r#"{"hour": 2, "minute": 0, "second": 0}"#)
        .await;

    harness.step();
    assert_eq!(harness.clock.time(), (2, 0, 1));
}

#[tokio::test]
async fn sync_time_resyncs_with_wall_clock() {
    let mut harness = Harness::new();
    harness.now = wall(18, 45, 10);
    let (status, _) = harness.post("/sync_time", r#"{"sync": true}"#).await;
    assert_eq!(status, StatusCode::OK);

    let snapshot = harness.step();
    assert_eq!(
        (
            snapshot.current_hour,
            snapshot.current_minute,
            snapshot.current_second
        ),
        (6, 45, 11)
    );
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let harness = Harness::new();
    let (status, _) = harness.post("/set_date", "{}").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
