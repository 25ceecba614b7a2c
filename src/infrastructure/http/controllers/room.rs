use crate::domain::events::SessionFrame;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName},
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use futures::stream::StreamExt;
use serde_json::{json, Value};
use std::convert::Infallible;

/// Cookie carrying the author handle issued by the identity endpoint
pub const AUTHOR_COOKIE: &str = "scib_username";

/// Text of a post body. Missing, null, false and zero count as empty; other
/// scalars are taken in their string form.
pub fn post_text(body: &Value) -> String {
    match body.get("text") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// GET /api/room/:slug - Thread history, most recent first
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let thread = state.room_service.list_posts().await?;
    Ok(Json(thread))
}

/// POST /api/room/:slug - Add a post and push it to live viewers
pub async fn create_post(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload.map_err(|e| {
        tracing::debug!("Rejected post body: {}", e);
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;

    let author = jar.get(AUTHOR_COOKIE).map(|cookie| cookie.value());
    let post = state
        .room_service
        .create_post(author, &post_text(&body))
        .await?;

    Ok(Json(json!({ "ok": true, "post": post })))
}

/// GET /api/room/:slug/stream - SSE feed of new posts with keep-alive pings
pub async fn room_stream(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.live_feed.open_session();
    tracing::info!(session_id = %session.id(), "SSE connection established");

    let stream = session.map(|frame| Ok::<Event, Infallible>(to_sse_event(&frame)));

    (
        [
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        // Keep-alive comes from the session's own ping frames
        Sse::new(stream),
    )
}

fn to_sse_event(frame: &SessionFrame) -> Event {
    let json_data = serde_json::to_string(&frame.payload()).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize {} frame: {}", frame.kind(), e);
        "{}".to_string()
    });

    Event::default().event(frame.kind()).data(json_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_text_coercion() {
        assert_eq!(post_text(&json!({"text": "clue"})), "clue");
        assert_eq!(post_text(&json!({})), "");
        assert_eq!(post_text(&json!({"text": null})), "");
        assert_eq!(post_text(&Value::Null), "");
        assert_eq!(post_text(&json!(5)), "");
        assert_eq!(post_text(&json!({"text": 5})), "5");
        assert_eq!(post_text(&json!({"text": 0})), "");
        assert_eq!(post_text(&json!({"text": true})), "true");
        assert_eq!(post_text(&json!({"text": false})), "");
    }
}
