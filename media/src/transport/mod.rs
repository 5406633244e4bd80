pub mod handle;
pub mod luna_send;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportResult;

pub use handle::ServiceHandle;
pub use luna_send::LunaSendTransport;
pub use memory::{InMemoryMediaService, RecordedCall};

/// Bus address of the platform media service
pub const MEDIA_SERVICE_URI: &str = "luna://com.webos.media";

/// Named endpoints of the media service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Register,
  Load,
  Play,
  Pause,
  Seek,
  Stop,
  Status,
}

impl Method {
  pub fn name(&self) -> &'static str {
    match self {
      Method::Register => "register",
      Method::Load => "load",
      Method::Play => "play",
      Method::Pause => "pause",
      Method::Seek => "seek",
      Method::Stop => "stop",
      Method::Status => "status",
    }
  }

  /// Full bus address of this endpoint under `service_uri`
  pub fn uri(&self, service_uri: &str) -> String {
    format!("{}/{}", service_uri.trim_end_matches('/'), self.name())
  }
}

impl std::fmt::Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Opens connections to the media service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
  /// Connects to the service at `service_uri`, e.g. `luna://com.webos.media`
  async fn open(&self, service_uri: &str) -> TransportResult<Arc<dyn Connection>>;
}

/// An open, registered connection to the media service
///
/// Replies with `returnValue: false` must be turned into `TransportError::Call`
/// by the implementation, so `Ok` always means the service accepted the call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connection: Send + Sync {
  /// Sends one request and resolves with the first reply payload
  async fn call(&self, method: Method, payload: Value) -> TransportResult<Value>;

  /// Unregisters the connection. Called once, through `ServiceHandle`.
  fn release(&self);
}

/// Maps a raw bus reply to success or a call error
pub(crate) fn check_reply(method: Method, reply: Value) -> TransportResult<Value> {
  if reply.get("returnValue").and_then(Value::as_bool) == Some(false) {
    let message = reply
      .get("errorText")
      .and_then(Value::as_str)
      .map(str::to_string)
      .unwrap_or_else(|| format!("{} failed", method));
    return Err(crate::error::TransportError::call(method, message));
  }
  Ok(reply)
}
