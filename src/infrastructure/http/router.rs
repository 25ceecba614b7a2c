use crate::infrastructure::http::controllers::room;
use crate::infrastructure::http::middleware::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let room_path = format!("/api/room/{}", state.room_slug);
    let stream_path = format!("{}/stream", room_path);

    Router::new()
        .route(&room_path, get(room::list_posts).post(room::create_post))
        .route(&stream_path, get(room::room_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
