use crate::domain::entities::{NewRoomPost, RoomPost};
use crate::domain::errors::DomainResult;
use crate::domain::ports::clock::Clock;
use crate::domain::ports::post_repository::PostRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Volatile post store, for tests and throwaway rooms
pub struct InMemoryPostStore {
    posts: Mutex<Vec<RoomPost>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryPostStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            clock,
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostStore {
    async fn append(&self, post: NewRoomPost) -> DomainResult<RoomPost> {
        let post = post.into_post(self.clock.now_millis());
        self.posts.lock().await.push(post.clone());
        Ok(post)
    }

    async fn list(&self) -> DomainResult<Vec<RoomPost>> {
        Ok(self.posts.lock().await.clone())
    }
}
