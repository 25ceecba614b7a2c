use crate::application::services::{LiveFeedService, RoomService};

#[derive(Clone)]
pub struct AppState {
    /// URL segment naming the room, e.g. `case01`
    pub room_slug: String,
    pub room_service: RoomService,
    pub live_feed: LiveFeedService,
}
