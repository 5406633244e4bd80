use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{PlayerError, Result};
use crate::model::PlaybackSource;

const DEFAULT_MIME: &str = "application/x-mpegurl";
const DELIVERY_PATH: &str = "/v2/cdn/delivery";

/// Playable source resolved from a content id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryInfo {
    pub content_id: String,
    pub uri: String,
    pub mime_type: String,
    pub is_live: bool,
}

fn string_at<'a>(body: &'a Value, pointer: &str) -> Option<&'a str> {
    body.pointer(pointer).and_then(Value::as_str)
}

impl DeliveryInfo {
    /// Parses a delivery response body
    ///
    /// Each field is read on its own: a missing or non-string field falls
    /// back to its default. Only a missing or empty `source.uri` is an error.
    pub fn from_json(body: &Value) -> Result<Self> {
        let uri = string_at(body, "/source/uri").unwrap_or_default();
        if uri.is_empty() {
            return Err(PlayerError::MissingPlaybackUrl);
        }

        Ok(Self {
            content_id: string_at(body, "/id").unwrap_or_default().to_string(),
            uri: uri.to_string(),
            mime_type: string_at(body, "/source/mime").unwrap_or(DEFAULT_MIME).to_string(),
            is_live: string_at(body, "/source/type") == Some("stream"),
        })
    }

    pub fn into_source(self) -> PlaybackSource {
        PlaybackSource::from_url(self.uri, self.mime_type, self.is_live).with_content_id(self.content_id)
    }
}

/// Maps a content id to a playable source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryResolver: Send + Sync {
    async fn resolve(&self, video_id: &str) -> Result<DeliveryInfo>;
}

/// Settings for the content API used for delivery resolution
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.floatplane.com/api".to_string(),
            user_agent: concat!("floatplane-webos/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves deliveries through the content API's `/v2/cdn/delivery` endpoint
#[derive(Debug, Clone)]
pub struct HttpDeliveryResolver {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDeliveryResolver {
    pub fn new(config: DeliveryConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Uses an existing client, e.g. one sharing the app's cookie store
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, video_id: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, DELIVERY_PATH))
            .query(&[("type", "video"), ("id", video_id)])
    }
}

#[async_trait]
impl DeliveryResolver for HttpDeliveryResolver {
    async fn resolve(&self, video_id: &str) -> Result<DeliveryInfo> {
        log::debug!("Resolving delivery for video {}", video_id);
        let body: Value = self
            .request(video_id)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        DeliveryInfo::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_vod_delivery() {
        let body = json!({
            "id": "abc123",
            "source": {"uri": "https://cdn/abc.m3u8", "mime": "application/vnd.apple.mpegurl", "type": "vod"}
        });

        let info = DeliveryInfo::from_json(&body).unwrap();
        assert_eq!(info.content_id, "abc123");
        assert_eq!(info.uri, "https://cdn/abc.m3u8");
        assert_eq!(info.mime_type, "application/vnd.apple.mpegurl");
        assert!(!info.is_live);
    }

    #[test]
    fn test_stream_type_is_live_and_mime_defaults() {
        let body = json!({"id": "live1", "source": {"uri": "https://cdn/live.m3u8", "type": "stream"}});

        let info = DeliveryInfo::from_json(&body).unwrap();
        assert!(info.is_live);
        assert_eq!(info.mime_type, "application/x-mpegurl");
    }

    #[test]
    fn test_mistyped_fields_fall_back_individually() {
        let body = json!({
            "id": 42,
            "source": {"uri": "https://cdn/a.m3u8", "mime": 7, "type": ["stream"]}
        });

        let info = DeliveryInfo::from_json(&body).unwrap();
        assert_eq!(info.content_id, "");
        assert_eq!(info.uri, "https://cdn/a.m3u8");
        assert_eq!(info.mime_type, "application/x-mpegurl");
        assert!(!info.is_live);
    }

    #[test]
    fn test_missing_uri_is_an_error() {
        assert_eq!(
            DeliveryInfo::from_json(&json!({"id": "x", "source": {"uri": ""}})),
            Err(PlayerError::MissingPlaybackUrl)
        );
        assert_eq!(DeliveryInfo::from_json(&json!({})), Err(PlayerError::MissingPlaybackUrl));
        assert_eq!(DeliveryInfo::from_json(&json!([1, 2])), Err(PlayerError::MissingPlaybackUrl));
        assert_eq!(
            DeliveryInfo::from_json(&json!({"source": {"uri": 5}})),
            Err(PlayerError::MissingPlaybackUrl)
        );
    }

    #[test]
    fn test_into_source_keeps_content_id() {
        let info = DeliveryInfo {
            content_id: "abc".to_string(),
            uri: "u".to_string(),
            mime_type: "m".to_string(),
            is_live: false,
        };
        let source = info.into_source();
        assert_eq!(source.content_id.as_deref(), Some("abc"));
        assert_eq!(source.url, "u");
    }

    #[test]
    fn test_request_targets_delivery_endpoint() {
        let resolver = HttpDeliveryResolver::new(DeliveryConfig {
            base_url: "https://example.test/api/".to_string(),
            ..DeliveryConfig::default()
        })
        .unwrap();

        let request = resolver.request("abc 123").build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://example.test/api/v2/cdn/delivery?type=video&id=abc+123"
        );
        assert_eq!(request.method(), reqwest::Method::GET);
    }
}
