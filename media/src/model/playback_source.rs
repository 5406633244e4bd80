use serde_json::{json, Value};

/// What to play: immutable once attached, replaced wholesale on a new load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSource {
    /// Content id the source was resolved from, `None` for raw URLs
    pub content_id: Option<String>,
    pub url: String,
    pub mime_type: String,
    pub is_live: bool,
}

impl PlaybackSource {
    pub fn from_url(url: impl Into<String>, mime_type: impl Into<String>, is_live: bool) -> Self {
        Self {
            content_id: None,
            url: url.into(),
            mime_type: mime_type.into(),
            is_live,
        }
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        let content_id = content_id.into();
        self.content_id = if content_id.is_empty() { None } else { Some(content_id) };
        self
    }

    /// Source kind as the media service names it
    pub fn kind(&self) -> &'static str {
        if self.is_live {
            "live"
        } else {
            "media"
        }
    }

    /// `source` object of the `load` request body
    pub fn to_payload(&self) -> Value {
        json!({
            "type": self.kind(),
            "url": self.url,
            "mime": self.mime_type,
        })
    }
}
