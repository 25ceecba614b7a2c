use crate::application::services::{LiveFeedService, RoomService};
use crate::config::Config;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::event_bus::EventBus;
use crate::domain::ports::post_repository::PostRepository;
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::JsonFilePostStore;
use crate::infrastructure::runtime::clock::SystemClock;
use std::sync::Arc;

/// Wire the room services around the given bus and the configured JSON store
pub fn build_app_state(config: &Config, bus: Arc<dyn EventBus>) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let store: Arc<dyn PostRepository> = Arc::new(JsonFilePostStore::new(
        config.room_data_path.clone(),
        config.room_case_id.clone(),
        clock.clone(),
    ));
    tracing::info!(
        path = %config.room_data_path.display(),
        "Room post store initialized"
    );

    build_app_state_with(config, bus, store, clock)
}

/// Same as [`build_app_state`] with an explicit store and clock
pub fn build_app_state_with(
    config: &Config,
    bus: Arc<dyn EventBus>,
    store: Arc<dyn PostRepository>,
    clock: Arc<dyn Clock>,
) -> AppState {
    let room_service = RoomService::new(store, bus.clone(), config.room_case_id.clone());
    tracing::info!(case_id = %config.room_case_id, "Room service initialized");

    let live_feed = LiveFeedService::new(bus, clock, config.keep_alive);
    tracing::info!(
        "Live feed initialized with {}s keep-alive",
        config.keep_alive.as_secs()
    );

    AppState {
        room_slug: config.room_slug.clone(),
        room_service,
        live_feed,
    }
}
