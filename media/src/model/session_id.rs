use serde::{Deserialize, Serialize};

/// Opaque session identifier handed out by the media service on `register`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
  /// Creates a SessionId, rejecting empty or whitespace-only ids
  pub fn new(id: impl Into<String>) -> Option<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      None
    } else {
      Some(Self(id))
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for SessionId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl AsRef<str> for SessionId {
  fn as_ref(&self) -> &str {
    &self.0
  }
}
