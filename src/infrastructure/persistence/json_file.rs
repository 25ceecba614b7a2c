use crate::domain::entities::{NewRoomPost, RoomPost, RoomState};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::clock::Clock;
use crate::domain::ports::post_repository::PostRepository;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

/// Keeps the whole room thread in one pretty-printed JSON document.
///
/// Writes go to a sibling temp file that is then renamed over the document,
/// so a crash mid-write leaves the previous version intact. A missing or
/// corrupt document is replaced by a fresh, empty thread; any other read
/// failure is reported and the document is left alone.
pub struct JsonFilePostStore {
    path: PathBuf,
    case_id: String,
    clock: Arc<dyn Clock>,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFilePostStore {
    pub fn new(path: impl Into<PathBuf>, case_id: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            case_id: case_id.into(),
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_state(&self) -> DomainResult<RoomState> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str::<RoomState>(&raw) {
                Ok(state) => return Ok(state),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    "Room state is unreadable, starting a fresh thread: {}",
                    e
                ),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Creating room state file");
            }
            // Not UTF-8, so treated like any other corrupt document
            Err(e) if e.kind() == ErrorKind::InvalidData => tracing::warn!(
                path = %self.path.display(),
                "Room state is unreadable, starting a fresh thread: {}",
                e
            ),
            Err(e) => {
                return Err(DomainError::Internal(format!(
                    "Failed to read room state: {}",
                    e
                )))
            }
        }

        let fresh = RoomState::fresh(self.case_id.clone(), self.clock.now_millis());
        self.write_state(&fresh).await?;
        Ok(fresh)
    }

    async fn write_state(&self, state: &RoomState) -> DomainResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Internal(format!("Failed to create directory: {}", e)))?;
        }

        let raw = serde_json::to_string_pretty(state)
            .map_err(|e| DomainError::Internal(format!("Failed to encode room state: {}", e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, raw)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to write room state: {}", e)))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to replace room state: {}", e)))
    }
}

#[async_trait]
impl PostRepository for JsonFilePostStore {
    async fn append(&self, post: NewRoomPost) -> DomainResult<RoomPost> {
        let _guard = self.lock.lock().await;

        let mut state = self.read_state().await?;
        let post = post.into_post(self.clock.now_millis());
        state.posts.push(post.clone());
        self.write_state(&state).await?;

        Ok(post)
    }

    async fn list(&self) -> DomainResult<Vec<RoomPost>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_state().await?.posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::runtime::clock::SystemClock;

    fn store(dir: &tempfile::TempDir) -> JsonFilePostStore {
        JsonFilePostStore::new(
            dir.path().join("room").join("case01.json"),
            "SCIB-CC-1991-022",
            Arc::new(SystemClock::new()),
        )
    }

    #[tokio::test]
    async fn test_missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let posts = store.list().await.unwrap();
        assert!(posts.is_empty());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let state: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(state["caseId"], "SCIB-CC-1991-022");
        assert_eq!(state["version"], 1);
    }

    #[tokio::test]
    async fn test_append_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let first = store(&dir)
            .append(NewRoomPost::new("A", "first"))
            .await
            .unwrap();
        store(&dir)
            .append(NewRoomPost::new("B", "second"))
            .await
            .unwrap();

        let posts = store(&dir).list().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0], first);
        assert_eq!(posts[1].who, "B");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(store.list().await.unwrap().is_empty());
        store.append(NewRoomPost::new("A", "x")).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_keeps_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        // A directory where the document should be cannot be read as a file
        std::fs::create_dir_all(store.path()).unwrap();

        let err = store.list().await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)), "got {:?}", err);
        assert!(store
            .append(NewRoomPost::new("A", "x"))
            .await
            .is_err());
        assert!(store.path().is_dir());
    }
}
