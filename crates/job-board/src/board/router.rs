use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::dispatcher::Dispatcher;
use super::events::Event;
use super::messenger::Messenger;
use super::store::BoardStore;

/// Router accepting chat events over HTTP, for webhook-style transports and
/// local testing.
pub fn event_router<S, M>(dispatcher: Dispatcher<S, M>) -> Router
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    Router::new()
        .route("/api/v1/events", post(event_handler::<S, M>))
        .with_state(dispatcher)
}

/// Handles the event before answering; failures are reported to the chat user,
/// not to the HTTP caller.
pub(crate) async fn event_handler<S, M>(
    State(dispatcher): State<Dispatcher<S, M>>,
    axum::Json(event): axum::Json<Event>,
) -> Response
where
    S: BoardStore + 'static,
    M: Messenger + 'static,
{
    let sender = event.sender;
    dispatcher.handle(event).await;
    let payload = json!({
        "status": "accepted",
        "sender": sender,
    });
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}
