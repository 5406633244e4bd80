use crate::transport::Method;

/// Errors raised while talking to the media service through a transport
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
  #[error("{0}")]
  Connection(String),

  #[error("{message}")]
  Call { method: Method, message: String },

  #[error("Malformed reply to {method}: {message}")]
  MalformedReply { method: Method, message: String },

  #[error("Connection already released")]
  Released,
}

impl TransportError {
  pub fn call(method: Method, message: impl Into<String>) -> Self {
    TransportError::Call { method, message: message.into() }
  }
}

impl From<std::io::Error> for TransportError {
  fn from(err: std::io::Error) -> Self {
    TransportError::Connection(err.to_string())
  }
}

/// Errors surfaced by the playback layer
///
/// At the event boundary every variant collapses into a single
/// `PlayerEvent::ErrorOccurred` carrying `to_string()`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlayerError {
  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error("Failed to obtain media session")]
  MissingSessionId,

  #[error("Playback URL missing")]
  MissingPlaybackUrl,

  #[error("API unavailable")]
  ApiUnavailable,

  #[error("{0}")]
  Http(String),

  #[error("Invalid player configuration: {0}")]
  Config(String),

  #[error("Player has shut down")]
  Closed,
}

impl From<reqwest::Error> for PlayerError {
  fn from(err: reqwest::Error) -> Self {
    PlayerError::Http(err.to_string())
  }
}

pub type Result<T> = std::result::Result<T, PlayerError>;
pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_call_error_displays_service_message() {
    let err = TransportError::call(Method::Play, "Unknown session");
    assert_eq!(err.to_string(), "Unknown session");
  }

  #[test]
  fn test_player_error_wraps_transport_message() {
    let err: PlayerError = TransportError::Connection("bus unavailable".to_string()).into();
    assert_eq!(err.to_string(), "bus unavailable");
  }

  #[test]
  fn test_protocol_errors_have_fixed_messages() {
    assert_eq!(PlayerError::MissingSessionId.to_string(), "Failed to obtain media session");
    assert_eq!(PlayerError::MissingPlaybackUrl.to_string(), "Playback URL missing");
    assert_eq!(PlayerError::ApiUnavailable.to_string(), "API unavailable");
  }
}
