use std::sync::Arc;

use serde_json::Value;

use super::{Connection, Method};
use crate::error::TransportResult;

/// Owned connection to the media service
///
/// The connection is released exactly once, when the handle is dropped,
/// whichever path (success, failed registration, teardown) drops it.
pub struct ServiceHandle {
  connection: Arc<dyn Connection>,
}

impl ServiceHandle {
  pub fn new(connection: Arc<dyn Connection>) -> Self {
    Self { connection }
  }

  pub async fn call(&self, method: Method, payload: Value) -> TransportResult<Value> {
    self.connection.call(method, payload).await
  }

  /// Shared reference to the connection for calls that outlive a borrow of the handle
  pub fn connection(&self) -> Arc<dyn Connection> {
    self.connection.clone()
  }
}

impl Drop for ServiceHandle {
  fn drop(&mut self) {
    self.connection.release();
  }
}

impl std::fmt::Debug for ServiceHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ServiceHandle").finish_non_exhaustive()
  }
}
