use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;

use crate::board::{event_router, views};

fn post_event(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn posted_events_are_dispatched() {
    let harness = Harness::new();
    let router = event_router(harness.dispatcher());

    let response = router
        .oneshot(post_event(json!({
            "sender": SEEKER,
            "payload": {"type": "menu"}
        })))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["sender"], SEEKER.0);

    assert_eq!(harness.messenger.last_to(SEEKER).text(), views::SEEKER_MENU);
}

#[tokio::test]
async fn malformed_events_are_rejected() {
    let harness = Harness::new();
    let router = event_router(harness.dispatcher());

    let response = router
        .oneshot(post_event(json!({"sender": SEEKER})))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(harness.messenger.deliveries().is_empty());
}
