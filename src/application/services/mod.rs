pub mod live_feed;
pub mod room_service;

pub use live_feed::*;
pub use room_service::*;
