pub mod clock;
pub mod event_bus;
pub mod post_repository;
