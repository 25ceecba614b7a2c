/// Source of wall-clock timestamps for posts and stream frames
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}
