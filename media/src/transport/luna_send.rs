use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

use super::{check_reply, Connection, Method, Transport};
use crate::error::{TransportError, TransportResult};

const DEFAULT_PROGRAM: &str = "luna-send";

/// Reaches the media service through the platform `luna-send` tool
///
/// Every call runs `luna-send -n 1 <uri> <json>` and reads the single reply
/// printed on stdout. `<uri>` is the service address given to `open` joined
/// with the method name.
#[derive(Debug, Clone)]
pub struct LunaSendTransport {
  program: PathBuf,
  timeout: Duration,
}

impl LunaSendTransport {
  pub fn new() -> Self {
    Self {
      program: PathBuf::from(DEFAULT_PROGRAM),
      timeout: Duration::from_secs(10),
    }
  }

  pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
    self.program = program.into();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  fn resolve_program(&self) -> Option<PathBuf> {
    if self.program.components().count() > 1 {
      return self.program.is_file().then(|| self.program.clone());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
      .map(|dir| dir.join(&self.program))
      .find(|candidate| candidate.is_file())
  }
}

impl Default for LunaSendTransport {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Transport for LunaSendTransport {
  async fn open(&self, service_uri: &str) -> TransportResult<Arc<dyn Connection>> {
    let program = self.resolve_program().ok_or_else(|| {
      TransportError::Connection(format!("{} not found", self.program.display()))
    })?;

    log::debug!("Opened luna-send connection via {}", program.display());
    Ok(Arc::new(LunaSendConnection {
      program,
      service_uri: service_uri.to_string(),
      timeout: self.timeout,
      released: AtomicBool::new(false),
    }))
  }
}

struct LunaSendConnection {
  program: PathBuf,
  service_uri: String,
  timeout: Duration,
  released: AtomicBool,
}

#[async_trait]
impl Connection for LunaSendConnection {
  async fn call(&self, method: Method, payload: Value) -> TransportResult<Value> {
    if self.released.load(Ordering::Acquire) {
      return Err(TransportError::Released);
    }

    let uri = method.uri(&self.service_uri);
    let output = run(&self.program, &uri, &payload, self.timeout).await?;
    let reply = parse_output(method, &output.stdout, &output.stderr)?;
    check_reply(method, reply)
  }

  fn release(&self) {
    if !self.released.swap(true, Ordering::AcqRel) {
      log::debug!("Released luna-send connection to {}", self.service_uri);
    }
  }
}

async fn run(
  program: &Path,
  uri: &str,
  payload: &Value,
  timeout: Duration,
) -> TransportResult<std::process::Output> {
  let mut command = Command::new(program);
  command
    .arg("-n")
    .arg("1")
    .arg(uri)
    .arg(payload.to_string())
    .kill_on_drop(true);

  match tokio::time::timeout(timeout, command.output()).await {
    Ok(output) => Ok(output?),
    Err(_) => Err(TransportError::Connection(format!(
      "{} timed out after {} ms",
      uri,
      timeout.as_millis()
    ))),
  }
}

/// Extracts the reply object printed by `luna-send -n 1`
fn parse_output(method: Method, stdout: &[u8], stderr: &[u8]) -> TransportResult<Value> {
  let stdout = String::from_utf8_lossy(stdout);
  let line = stdout.lines().rev().map(str::trim).find(|l| !l.is_empty());

  match line {
    Some(line) => serde_json::from_str(line).map_err(|e| TransportError::MalformedReply {
      method,
      message: e.to_string(),
    }),
    None => {
      let stderr = String::from_utf8_lossy(stderr).trim().to_string();
      let message = if stderr.is_empty() { format!("{} produced no reply", method) } else { stderr };
      Err(TransportError::call(method, message))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transport::MEDIA_SERVICE_URI;
  use serde_json::json;

  #[test]
  fn test_parse_output_reads_last_line() {
    let stdout = b"\n{\"returnValue\":true,\"sessionId\":\"_local.1\"}\n";
    let reply = parse_output(Method::Register, stdout, b"").unwrap();
    assert_eq!(reply, json!({"returnValue": true, "sessionId": "_local.1"}));
  }

  #[test]
  fn test_parse_output_without_reply_uses_stderr() {
    let err = parse_output(Method::Play, b"", b"LSRegister failed\n").unwrap_err();
    assert_eq!(err, TransportError::call(Method::Play, "LSRegister failed"));
  }

  #[test]
  fn test_parse_output_without_anything() {
    let err = parse_output(Method::Stop, b"  \n", b"").unwrap_err();
    assert_eq!(err.to_string(), "stop produced no reply");
  }

  #[test]
  fn test_parse_output_rejects_garbage() {
    let err = parse_output(Method::Status, b"not json", b"").unwrap_err();
    assert!(matches!(err, TransportError::MalformedReply { method: Method::Status, .. }));
  }

  #[tokio::test]
  async fn test_open_fails_for_missing_program() {
    let transport = LunaSendTransport::new().with_program("/nonexistent/bin/luna-send");
    let err = transport.open(MEDIA_SERVICE_URI).await.err().unwrap();
    assert_eq!(err, TransportError::Connection("/nonexistent/bin/luna-send not found".to_string()));
  }

  #[tokio::test]
  async fn test_released_connection_rejects_calls() {
    let connection = LunaSendConnection {
      program: PathBuf::from(DEFAULT_PROGRAM),
      service_uri: MEDIA_SERVICE_URI.to_string(),
      timeout: Duration::from_secs(1),
      released: AtomicBool::new(false),
    };
    connection.release();
    let err = connection.call(Method::Status, json!({})).await.unwrap_err();
    assert_eq!(err, TransportError::Released);
  }

  #[cfg(unix)]
  fn script(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join("luna-send");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_call_passes_uri_and_payload_and_reads_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let program = script(
      &dir,
      r#"echo "subscribing..." >&2
echo ""
printf '{"returnValue":true,"argc":%d,"flag":"%s","count":"%s","uri":"%s","payload":%s}\n' "$#" "$1" "$2" "$3" "$4""#,
    );

    let transport = LunaSendTransport::new().with_program(&program);
    let connection = transport.open("luna://com.example.media").await.unwrap();
    let reply = connection
      .call(Method::Seek, json!({"sessionId": "_local.1", "target": 30000}))
      .await
      .unwrap();

    assert_eq!(reply["argc"], 4);
    assert_eq!(reply["flag"], "-n");
    assert_eq!(reply["count"], "1");
    assert_eq!(reply["uri"], "luna://com.example.media/seek");
    assert_eq!(reply["payload"], json!({"sessionId": "_local.1", "target": 30000}));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_call_maps_service_error_reply() {
    let dir = tempfile::tempdir().unwrap();
    let program = script(&dir, r#"echo '{"returnValue":false,"errorText":"Invalid session"}'"#);

    let connection = LunaSendTransport::new()
      .with_program(&program)
      .open(MEDIA_SERVICE_URI)
      .await
      .unwrap();
    let err = connection.call(Method::Pause, json!({"sessionId": "x"})).await.unwrap_err();

    assert_eq!(err, TransportError::call(Method::Pause, "Invalid session"));
  }

  #[cfg(unix)]
  #[tokio::test]
  async fn test_call_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let program = script(&dir, "sleep 5");

    let connection = LunaSendTransport::new()
      .with_program(&program)
      .with_timeout(Duration::from_millis(200))
      .open(MEDIA_SERVICE_URI)
      .await
      .unwrap();
    let err = connection.call(Method::Status, json!({})).await.unwrap_err();

    assert_eq!(
      err,
      TransportError::Connection("luna://com.webos.media/status timed out after 200 ms".to_string())
    );
  }
}
