// src/ingest/types.rs
use chrono::{DateTime, Utc};

/// Leading marker identifying a repost.
pub const REPOST_MARKER: &str = "RT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Referenced media keys in attachment order (empty when the post has none).
    pub media_keys: Vec<String>,
}

impl Post {
    pub fn is_repost(&self) -> bool {
        self.text.starts_with(REPOST_MARKER)
    }

    /// Only the first referenced key links a post to media.
    pub fn first_media_key(&self) -> Option<&str> {
        self.media_keys.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Photo,
    AnimatedGif,
    /// The payload carried no `type` field.
    Unknown,
    Other(String),
}

impl MediaKind {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Unknown,
            Some("video") => Self::Video,
            Some("photo") => Self::Photo,
            Some("animated_gif") => Self::AnimatedGif,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub media_key: String,
    pub kind: MediaKind,
    pub preview_image_url: Option<String>,
    pub view_count: u64,
    pub duration_ms: Option<u64>,
}

impl Media {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    pub id: String,
    pub handle: String,
    pub name: Option<String>,
    pub followers: u64,
}

/// Posts authored inside the window plus the media they reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostBatch {
    pub posts: Vec<Post>,
    pub media: Vec<Media>,
}

impl PostBatch {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.media.is_empty()
    }
}

/// Per-account fetch failure. Never carries partial data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("api error: {0}")]
    Api(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Fetch adapter: posts + media for one account since `window_start` (window end is "now").
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(
        &self,
        handle: &str,
        window_start: DateTime<Utc>,
    ) -> Result<PostBatch, FetchError>;
    fn name(&self) -> &'static str;
}

/// Account profile adapter: identity + follower count for one handle.
#[async_trait::async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self, handle: &str) -> Result<AccountProfile, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_parse_handles_missing_and_unknown() {
        assert_eq!(MediaKind::parse(Some("video")), MediaKind::Video);
        assert_eq!(MediaKind::parse(None), MediaKind::Unknown);
        assert_eq!(
            MediaKind::parse(Some("hologram")),
            MediaKind::Other("hologram".into())
        );
    }

    #[test]
    fn repost_marker_is_prefix_only() {
        let mut p = Post {
            id: "1".into(),
            author_id: "a".into(),
            text: "RT @espn: wow".into(),
            created_at: Utc::now(),
            media_keys: vec![],
        };
        assert!(p.is_repost());
        p.text = "Watch this RT".into();
        assert!(!p.is_repost());
    }
}
