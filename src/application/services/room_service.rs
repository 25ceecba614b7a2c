use crate::domain::entities::{
    normalize_author, NewRoomPost, RoomPost, RoomThread, MAX_POST_TEXT_UNITS,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::events::RoomEvent;
use crate::domain::ports::event_bus::EventBus;
use crate::domain::ports::post_repository::PostRepository;
use std::sync::Arc;

/// Reads and writes the shared investigation room thread
#[derive(Clone)]
pub struct RoomService {
    repo: Arc<dyn PostRepository>,
    bus: Arc<dyn EventBus>,
    case_id: String,
}

impl RoomService {
    pub fn new(repo: Arc<dyn PostRepository>, bus: Arc<dyn EventBus>, case_id: String) -> Self {
        Self { repo, bus, case_id }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Thread history, most recent first
    pub async fn list_posts(&self) -> DomainResult<RoomThread> {
        let mut posts = self.repo.list().await?;
        posts.sort_by(|a, b| b.ts.cmp(&a.ts));

        Ok(RoomThread {
            case_id: self.case_id.clone(),
            posts,
        })
    }

    /// Validate, durably append, then publish the post to live sessions
    pub async fn create_post(&self, author: Option<&str>, text: &str) -> DomainResult<RoomPost> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::ValidationError("Missing text".to_string()));
        }
        if text.encode_utf16().count() > MAX_POST_TEXT_UNITS {
            return Err(DomainError::ValidationError("Text too long".to_string()));
        }

        let who = normalize_author(author);
        let post = self.repo.append(NewRoomPost::new(who, text)).await?;

        metrics::counter!("room_posts_created_total").increment(1);
        tracing::info!(post_id = %post.id, who = %post.who, "Room post created");

        // Only published once the store has accepted it
        self.bus.emit(RoomEvent::Post(post.clone()));

        Ok(post)
    }
}
