use std::time::Duration;

use crate::transport::MEDIA_SERVICE_URI;

/// Configuration for the playback session controller
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Bus address of the media service
    pub service_uri: String,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Streaming transport requested in `load` options
    pub stream_transport: String,
    /// Whether `load` asks for fullscreen output
    pub fullscreen: bool,
    /// Consecutive poll failures after which failures are logged as errors
    pub poll_failure_threshold: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            service_uri: MEDIA_SERVICE_URI.to_string(),
            poll_interval: Duration::from_millis(750),
            stream_transport: "hls".to_string(),
            fullscreen: true,
            poll_failure_threshold: 5,
        }
    }
}

impl PlayerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slower polling for low-resource devices
    pub fn minimal() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            poll_failure_threshold: 3,
            ..Self::default()
        }
    }

    pub fn production() -> Self {
        Self {
            poll_failure_threshold: 10,
            ..Self::default()
        }
    }

    pub fn with_service_uri(mut self, uri: impl Into<String>) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with("luna://") {
            return Err(format!("Service URI must use the luna:// scheme: {}", uri));
        }
        self.service_uri = uri;
        Ok(self)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self, String> {
        if interval < Duration::from_millis(100) {
            return Err("Poll interval must be at least 100 ms".to_string());
        }
        if interval > Duration::from_secs(60) {
            return Err("Poll interval too long (max 60 seconds)".to_string());
        }
        self.poll_interval = interval;
        Ok(self)
    }

    pub fn with_stream_transport(mut self, transport: impl Into<String>) -> Self {
        self.stream_transport = transport.into();
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_poll_failure_threshold(mut self, threshold: u32) -> Result<Self, String> {
        if threshold == 0 {
            return Err("Poll failure threshold must be greater than 0".to_string());
        }
        self.poll_failure_threshold = threshold;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.service_uri.starts_with("luna://") {
            return Err("Service URI must use the luna:// scheme".to_string());
        }
        if self.poll_interval < Duration::from_millis(100) || self.poll_interval > Duration::from_secs(60) {
            return Err("Poll interval out of range".to_string());
        }
        if self.stream_transport.is_empty() {
            return Err("Stream transport must not be empty".to_string());
        }
        if self.poll_failure_threshold == 0 {
            return Err("Poll failure threshold must be greater than 0".to_string());
        }
        Ok(())
    }
}
