pub mod room_post;

pub use room_post::*;
