use serde::{Deserialize, Serialize};

/// Maximum length of a post body, in UTF-16 code units as browsers count it
pub const MAX_POST_TEXT_UNITS: usize = 1200;

/// Maximum number of characters kept from an author handle
pub const MAX_AUTHOR_CHARS: usize = 24;

/// Author used when no handle was issued upstream
pub const UNIDENTIFIED_AUTHOR: &str = "UNIDENTIFIED";

/// A single message in the investigation room thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPost {
    pub id: String,
    pub ts: i64, // ms since epoch
    pub who: String,
    pub text: String,
}

/// A post on its way into the store; the store fills in id and ts when absent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoomPost {
    pub id: Option<String>,
    pub ts: Option<i64>,
    pub who: String,
    pub text: String,
}

impl NewRoomPost {
    pub fn new(who: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            ts: None,
            who: who.into(),
            text: text.into(),
        }
    }

    /// Resolve missing fields against the given clock reading
    pub fn into_post(self, now_millis: i64) -> RoomPost {
        let ts = self.ts.unwrap_or(now_millis);
        let id = self.id.unwrap_or_else(|| generate_post_id(ts));
        RoomPost {
            id,
            ts,
            who: self.who,
            text: self.text,
        }
    }
}

/// Post ids look like `1700000000000-9f3c2a1b0e4d5c6a`
pub fn generate_post_id(ts: i64) -> String {
    format!("{}-{:x}", ts, rand::random::<u64>())
}

/// Normalize the author handle carried by the identity cookie
pub fn normalize_author(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return UNIDENTIFIED_AUTHOR.to_string();
    }
    trimmed.chars().take(MAX_AUTHOR_CHARS).collect()
}

/// On-disk document holding the whole thread
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomState {
    pub version: u32,
    pub case_id: String,
    pub created_at: i64,
    #[serde(default)]
    pub posts: Vec<RoomPost>,
}

impl RoomState {
    pub fn fresh(case_id: impl Into<String>, created_at: i64) -> Self {
        Self {
            version: 1,
            case_id: case_id.into(),
            created_at,
            posts: Vec::new(),
        }
    }
}

/// History view returned to viewers, most recent post first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomThread {
    pub case_id: String,
    pub posts: Vec<RoomPost>,
}
