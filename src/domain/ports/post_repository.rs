use crate::domain::entities::{NewRoomPost, RoomPost};
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

/// Durable append-only storage for the room thread
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Durably append a post, assigning id and timestamp when absent
    async fn append(&self, post: NewRoomPost) -> DomainResult<RoomPost>;

    /// All posts in append order
    async fn list(&self) -> DomainResult<Vec<RoomPost>>;
}
