//! Common utilities for acceptance tests.

#![allow(dead_code)] // Not every helper is used by every test module

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use clock_core::{ClockState, WallTime};
use serde_json::Value;
use tower::ServiceExt;

/// Tolerance for angle comparisons.
pub const EPS: f64 = 1e-9;

/// Clock with its counters set to `h:m:s` on the dial.
pub fn clock_at(h: u32, m: u32, s: u32) -> ClockState {
    let mut clock = ClockState::new();
    clock.set_time(h, m, s).expect("time in range");
    clock
}

/// Wall-clock reading for tests.
pub fn wall(h: u32, m: u32, s: u32) -> WallTime {
    WallTime::new(h, m, s).expect("wall time in range")
}

/// Assert two angles are equal within [`EPS`].
pub fn assert_angle(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "angle {actual} != expected {expected}"
    );
}

/// Send one request through the router and decode the JSON body, if any.
pub async fn request(app: Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request");
    let response = app.oneshot(request).await.expect("infallible service");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body fits");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, value)
}
