use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use uuid::Uuid;

use super::{check_reply, Connection, Method, Transport};
use crate::error::{TransportError, TransportResult};

const SIMULATED_DURATION_MS: u64 = 10 * 60 * 1000;

/// A call received by the in-memory service
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub payload: Value,
}

/// Simulated media service living in the same process
///
/// Sessions get uuid-based ids and a play clock driven by `tokio::time`, so
/// a paused test runtime controls reported positions. Every call is
/// recorded, and individual calls can be scripted to fail, to return canned
/// status payloads, or to stay in flight until released.
#[derive(Clone, Default)]
pub struct InMemoryMediaService {
    inner: Arc<Mutex<ServiceState>>,
}

#[derive(Default)]
struct ServiceState {
    calls: Vec<RecordedCall>,
    opened_uris: Vec<String>,
    releases: usize,
    open_failure: Option<String>,
    failures: HashMap<Method, VecDeque<String>>,
    omit_next_session_id: bool,
    status_replies: VecDeque<Value>,
    status_gate: Option<Arc<Semaphore>>,
    sessions: HashMap<String, SimulatedSession>,
}

#[derive(Debug, Default)]
struct SimulatedSession {
    state: String,
    live: bool,
    position_ms: u64,
    playing_since: Option<Instant>,
}

impl SimulatedSession {
    fn position_ms(&self) -> u64 {
        let running = self
            .playing_since
            .map(|since| since.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.position_ms + running
    }

    fn freeze_clock(&mut self) {
        self.position_ms = self.position_ms();
        self.playing_since = None;
    }

    fn duration_ms(&self) -> u64 {
        if self.live || self.state.is_empty() {
            0
        } else {
            SIMULATED_DURATION_MS
        }
    }
}

impl InMemoryMediaService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        // a poisoned lock only means a test panicked mid-call
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Payloads of every call to `method`, in order
    pub fn payloads(&self, method: Method) -> Vec<Value> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.payload.clone())
            .collect()
    }

    pub fn call_count(&self, method: Method) -> usize {
        self.lock().calls.iter().filter(|c| c.method == method).count()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.lock().calls.iter().map(|c| c.method).collect()
    }

    pub fn open_count(&self) -> usize {
        self.lock().opened_uris.len()
    }

    /// Service address passed to each successful `open`, in order
    pub fn opened_uris(&self) -> Vec<String> {
        self.lock().opened_uris.clone()
    }

    pub fn release_count(&self) -> usize {
        self.lock().releases
    }

    /// Fails the next `open` with `message`
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.lock().open_failure = Some(message.into());
    }

    /// Fails the next call to `method` with `message`
    pub fn fail_next(&self, method: Method, message: impl Into<String>) {
        self.lock()
            .failures
            .entry(method)
            .or_default()
            .push_back(message.into());
    }

    /// Answers the next `register` successfully but without a session id
    pub fn omit_next_session_id(&self) {
        self.lock().omit_next_session_id = true;
    }

    /// Queues a raw payload to answer the next `status` call with
    pub fn push_status(&self, payload: Value) {
        self.lock().status_replies.push_back(payload);
    }

    /// Keeps subsequent `status` calls in flight until `release_status` is called
    pub fn hold_status(&self) {
        self.lock().status_gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Lets `count` held `status` calls complete
    pub fn release_status(&self, count: usize) {
        if let Some(gate) = self.lock().status_gate.as_ref() {
            gate.add_permits(count);
        }
    }

    /// Current simulated state of a session, if it exists
    pub fn session_state(&self, session_id: &str) -> Option<String> {
        self.lock().sessions.get(session_id).map(|s| s.state.clone())
    }

    async fn handle(&self, method: Method, payload: Value) -> TransportResult<Value> {
        let gate = {
            let mut state = self.lock();
            state.calls.push(RecordedCall { method, payload: payload.clone() });
            if method == Method::Status {
                state.status_gate.clone()
            } else {
                None
            }
        };

        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut state = self.lock();
        if let Some(message) = state.failures.get_mut(&method).and_then(VecDeque::pop_front) {
            return Err(TransportError::call(method, message));
        }

        let reply = state.apply(method, &payload);
        check_reply(method, reply)
    }
}

impl ServiceState {
    fn apply(&mut self, method: Method, payload: &Value) -> Value {
        if method == Method::Register {
            if std::mem::take(&mut self.omit_next_session_id) {
                return json!({"returnValue": true});
            }
            let id = format!("_media.{}", Uuid::new_v4().simple());
            self.sessions.insert(id.clone(), SimulatedSession::default());
            return json!({"returnValue": true, "sessionId": id});
        }

        if method == Method::Status {
            if let Some(reply) = self.status_replies.pop_front() {
                return reply;
            }
        }

        let session_id = payload.get("sessionId").and_then(Value::as_str).unwrap_or_default();
        let Some(session) = self.sessions.get_mut(session_id) else {
            return json!({"returnValue": false, "errorText": format!("Unknown session '{}'", session_id)});
        };

        match method {
            Method::Load => {
                session.live = payload.pointer("/payload/source/type").and_then(Value::as_str) == Some("live");
                session.state = "loaded".to_string();
                session.position_ms = 0;
                session.playing_since = None;
            }
            Method::Play => {
                if session.playing_since.is_none() {
                    session.playing_since = Some(Instant::now());
                }
                session.state = "playing".to_string();
            }
            Method::Pause => {
                session.freeze_clock();
                session.state = "paused".to_string();
            }
            Method::Seek => {
                session.position_ms = payload.get("target").and_then(Value::as_u64).unwrap_or(0);
                if session.playing_since.is_some() {
                    session.playing_since = Some(Instant::now());
                }
            }
            Method::Stop => {
                session.position_ms = 0;
                session.playing_since = None;
                session.state = "stopped".to_string();
            }
            Method::Status => {
                return json!({
                    "returnValue": true,
                    "state": session.state,
                    "currentTime": session.position_ms(),
                    "duration": session.duration_ms(),
                });
            }
            Method::Register => {}
        }

        json!({"returnValue": true})
    }
}

#[async_trait]
impl Transport for InMemoryMediaService {
    async fn open(&self, service_uri: &str) -> TransportResult<Arc<dyn Connection>> {
        let mut state = self.lock();
        if let Some(message) = state.open_failure.take() {
            return Err(TransportError::Connection(message));
        }
        state.opened_uris.push(service_uri.to_string());

        Ok(Arc::new(MemoryConnection {
            service: self.clone(),
            released: AtomicBool::new(false),
        }))
    }
}

struct MemoryConnection {
    service: InMemoryMediaService,
    released: AtomicBool,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn call(&self, method: Method, payload: Value) -> TransportResult<Value> {
        if self.released.load(Ordering::Acquire) {
            return Err(TransportError::Released);
        }
        self.service.handle(method, payload).await
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            self.service.lock().releases += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MEDIA_SERVICE_URI;

    async fn register(connection: &Arc<dyn Connection>) -> String {
        let reply = connection
            .call(Method::Register, json!({"subscribe": true}))
            .await
            .unwrap();
        reply["sessionId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_issues_distinct_session_ids() {
        let service = InMemoryMediaService::new();
        let connection = service.open(MEDIA_SERVICE_URI).await.unwrap();

        let first = register(&connection).await;
        let second = register(&connection).await;

        assert!(first.starts_with("_media."));
        assert_ne!(first, second);
        assert_eq!(service.call_count(Method::Register), 2);
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let service = InMemoryMediaService::new();
        let connection = service.open(MEDIA_SERVICE_URI).await.unwrap();

        let err = connection
            .call(Method::Play, json!({"sessionId": "nope"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown session 'nope'");
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_clock_advances_with_time() {
        let service = InMemoryMediaService::new();
        let connection = service.open(MEDIA_SERVICE_URI).await.unwrap();
        let id = register(&connection).await;

        let source = json!({"sessionId": id, "payload": {"source": {"type": "media"}}});
        connection.call(Method::Load, source).await.unwrap();
        connection.call(Method::Play, json!({"sessionId": id})).await.unwrap();
        tokio::time::advance(std::time::Duration::from_millis(2500)).await;

        let status = connection.call(Method::Status, json!({"sessionId": id})).await.unwrap();
        assert_eq!(status["state"], "playing");
        assert_eq!(status["currentTime"], 2500);
        assert_eq!(status["duration"], SIMULATED_DURATION_MS);
    }

    #[tokio::test]
    async fn test_scripted_failure_applies_once() {
        let service = InMemoryMediaService::new();
        let connection = service.open(MEDIA_SERVICE_URI).await.unwrap();
        let id = register(&connection).await;
        service.fail_next(Method::Pause, "Cannot pause");

        let first = connection.call(Method::Pause, json!({"sessionId": id})).await;
        let second = connection.call(Method::Pause, json!({"sessionId": id})).await;

        assert_eq!(first.unwrap_err().to_string(), "Cannot pause");
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_release_is_counted_once() {
        let service = InMemoryMediaService::new();
        let connection = service.open(MEDIA_SERVICE_URI).await.unwrap();

        connection.release();
        connection.release();

        assert_eq!(service.release_count(), 1);
        assert_eq!(
            connection.call(Method::Status, json!({})).await.unwrap_err(),
            TransportError::Released
        );
    }

    #[tokio::test]
    async fn test_open_failure_is_one_shot() {
        let service = InMemoryMediaService::new();
        service.fail_next_open("bus unavailable");

        assert!(service.open(MEDIA_SERVICE_URI).await.is_err());
        assert!(service.open(MEDIA_SERVICE_URI).await.is_ok());
        assert_eq!(service.open_count(), 1);
        assert_eq!(service.opened_uris(), vec![MEDIA_SERVICE_URI.to_string()]);
    }
}
