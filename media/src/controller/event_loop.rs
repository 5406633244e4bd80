use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use super::command::Command;
use super::session::{ActiveSession, PendingRegistration, SessionSlot, SessionSnapshot};
use crate::config::PlayerConfig;
use crate::diagnostics::DiagnosticSink;
use crate::error::{PlayerError, TransportResult};
use crate::model::{PlaybackSource, PlaybackState, PlayerEvent, SessionId, StatusSample};
use crate::transport::{Method, ServiceHandle, Transport};

/// Replies from calls that complete outside the command flow
#[derive(Debug)]
pub(crate) enum Completion {
    Registered(TransportResult<Value>),
    Polled {
        generation: u64,
        sequence: u64,
        result: TransportResult<Value>,
    },
}

/// Drives one media session on the remote media service
///
/// Runs as a single task that owns all session state. Commands arrive on a
/// channel and are handled strictly in order. Registration replies and
/// status polls run as spawned calls whose results come back as
/// `Completion`s, so a slow poll never blocks a command.
pub struct PlaybackSessionController {
    transport: Arc<dyn Transport>,
    config: PlayerConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    completions: mpsc::UnboundedSender<Completion>,
    session: SessionSlot,
    state: PlaybackState,
    source: Option<PlaybackSource>,
    position_secs: u64,
    duration_secs: u64,
    ticker: Option<Interval>,
    /// Bumped whenever polling starts or stops; replies tagged with an older value are stale
    poll_generation: u64,
    /// Increases with every poll issued
    poll_sequence: u64,
    /// Sequence of the newest poll reply handled; older replies are dropped
    last_poll_handled: u64,
    consecutive_poll_failures: u32,
}

impl PlaybackSessionController {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        config: PlayerConfig,
        diagnostics: Arc<dyn DiagnosticSink>,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (completions, completion_receiver) = mpsc::unbounded_channel();
        let controller = Self {
            transport,
            config,
            diagnostics,
            events,
            completions,
            session: SessionSlot::Absent,
            state: PlaybackState::Idle,
            source: None,
            position_secs: 0,
            duration_secs: 0,
            ticker: None,
            poll_generation: 0,
            poll_sequence: 0,
            last_poll_handled: 0,
            consecutive_poll_failures: 0,
        };
        (controller, completion_receiver)
    }

    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        self.diagnostics.debug("Playback controller started");

        loop {
            tokio::select! {
                biased;
                Some(completion) = completions.recv() => self.complete(completion).await,
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.submit(command).await,
                },
                _ = next_tick(&mut self.ticker) => self.spawn_poll(),
            }
        }

        self.teardown().await;
        self.diagnostics.debug("Playback controller stopped");
    }

    async fn submit(&mut self, command: Command) {
        if let SessionSlot::Pending(pending) = &mut self.session {
            pending.deferred.push_back(command);
            return;
        }
        self.execute(command).await;
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Load(source) if self.session.is_active() => self.load(source).await,
            Command::Play if self.session.is_active() => self.play().await,
            command @ (Command::Load(_) | Command::Play) => self.ensure_session(command).await,
            Command::Pause => self.pause().await,
            Command::Seek(position_secs) => self.seek(position_secs).await,
            Command::Stop => self.stop().await,
            Command::Teardown(ack) => {
                self.teardown().await;
                let _ = ack.send(());
            }
            Command::Settle(ack) => {
                let _ = ack.send(());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    /// Opens a connection and starts registration on behalf of `trigger`
    ///
    /// The registration reply arrives later as `Completion::Registered`;
    /// `trigger` runs then, once the session id is known.
    async fn ensure_session(&mut self, trigger: Command) {
        let connection = match self.transport.open(&self.config.service_uri).await {
            Ok(connection) => connection,
            Err(e) => {
                self.report(e.into());
                return;
            }
        };

        let handle = ServiceHandle::new(connection);
        let connection = handle.connection();
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = connection.call(Method::Register, json!({"subscribe": true})).await;
            let _ = completions.send(Completion::Registered(result));
        });

        self.diagnostics.debug("Registering media session");
        self.session = SessionSlot::Pending(PendingRegistration {
            handle,
            trigger,
            deferred: VecDeque::new(),
        });
    }

    async fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Registered(result) => self.complete_registration(result).await,
            Completion::Polled {
                generation,
                sequence,
                result,
            } => self.complete_poll(generation, sequence, result),
        }
    }

    async fn complete_registration(&mut self, result: TransportResult<Value>) {
        if !self.session.is_pending() {
            self.diagnostics.debug("Ignoring registration reply without a pending registration");
            return;
        }
        let SessionSlot::Pending(pending) = std::mem::take(&mut self.session) else { return };

        let session_id = result.map_err(PlayerError::from).and_then(|reply| {
            reply
                .get("sessionId")
                .and_then(Value::as_str)
                .and_then(SessionId::new)
                .ok_or(PlayerError::MissingSessionId)
        });

        let PendingRegistration { handle, trigger, deferred } = pending;
        match session_id {
            Ok(id) => {
                self.diagnostics.debug(&format!("Media session {} registered", id));
                self.session = SessionSlot::Active(ActiveSession { handle, id });
                self.replay(Some(trigger), deferred).await;
            }
            Err(e) => {
                drop(handle);
                self.report(e);
                self.replay(None, deferred).await;
            }
        }
    }

    /// Runs queued commands in order, re-queueing the rest if one of them
    /// starts another registration
    async fn replay(&mut self, trigger: Option<Command>, deferred: VecDeque<Command>) {
        let mut queue: VecDeque<Command> = trigger.into_iter().chain(deferred).collect();
        while let Some(command) = queue.pop_front() {
            self.execute(command).await;
            if let SessionSlot::Pending(pending) = &mut self.session {
                pending.deferred.extend(queue.drain(..));
                return;
            }
        }
    }

    async fn load(&mut self, source: PlaybackSource) {
        let Some(session) = self.session.active() else { return };
        let payload = json!({
            "sessionId": session.id,
            "payload": {
                "source": source.to_payload(),
                "options": {
                    "transport": self.config.stream_transport,
                    "fullscreen": self.config.fullscreen,
                },
            },
        });

        if let Err(e) = session.handle.call(Method::Load, payload).await {
            self.report(e.into());
            return;
        }

        self.diagnostics.debug(&format!("Loaded {} ({})", source.url, source.mime_type));
        self.source = Some(source);
        self.set_state(PlaybackState::Loaded);
        self.start_polling();
    }

    async fn play(&mut self) {
        if self.call_on_session(Method::Play, json!({})).await {
            self.set_state(PlaybackState::Playing);
        }
    }

    async fn pause(&mut self) {
        if self.call_on_session(Method::Pause, json!({})).await {
            self.set_state(PlaybackState::Paused);
        }
    }

    async fn seek(&mut self, position_secs: u64) {
        let target = position_secs.saturating_mul(1000);
        self.call_on_session(Method::Seek, json!({"target": target})).await;
    }

    async fn stop(&mut self) {
        let Some(session) = self.session.active() else { return };

        // stop is best-effort; the service not acknowledging it is not reported
        let payload = json!({"sessionId": session.id});
        if let Err(e) = session.handle.call(Method::Stop, payload).await {
            self.diagnostics.warn(&format!("stop failed: {}", e));
        }

        self.stop_polling();
        self.set_state(PlaybackState::Stopped);
    }

    async fn teardown(&mut self) {
        self.stop().await;
        self.stop_polling();
        if let SessionSlot::Active(session) = std::mem::take(&mut self.session) {
            self.diagnostics.debug(&format!("Releasing media session {}", session.id));
        }
    }

    /// Sends `method` with the session id merged into `extra`
    ///
    /// Returns false without sending when there is no session, and reports
    /// the error when the call fails.
    async fn call_on_session(&self, method: Method, mut extra: Value) -> bool {
        let Some(session) = self.session.active() else { return false };
        extra["sessionId"] = json!(session.id);

        match session.handle.call(method, extra).await {
            Ok(_) => true,
            Err(e) => {
                self.report(e.into());
                false
            }
        }
    }

    fn start_polling(&mut self) {
        let period = self.config.poll_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.poll_generation += 1;
        self.consecutive_poll_failures = 0;
        self.ticker = Some(ticker);
    }

    fn stop_polling(&mut self) {
        if self.ticker.take().is_some() {
            self.poll_generation += 1;
        }
    }

    fn spawn_poll(&mut self) {
        if !self.session.is_active() {
            self.stop_polling();
            return;
        }
        let Some(session) = self.session.active() else { return };

        let connection = session.handle.connection();
        let payload = json!({"sessionId": session.id});
        let generation = self.poll_generation;
        self.poll_sequence += 1;
        let sequence = self.poll_sequence;
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = connection.call(Method::Status, payload).await;
            let _ = completions.send(Completion::Polled {
                generation,
                sequence,
                result,
            });
        });
    }

    fn complete_poll(&mut self, generation: u64, sequence: u64, result: TransportResult<Value>) {
        if generation != self.poll_generation || self.ticker.is_none() || !self.session.is_active() {
            self.diagnostics.debug("Discarding stale status reply");
            return;
        }
        // polls overlap when the service is slower than the interval
        if sequence <= self.last_poll_handled {
            self.diagnostics.debug(&format!("Discarding out-of-order status reply #{}", sequence));
            return;
        }
        self.last_poll_handled = sequence;

        match result {
            Ok(payload) => {
                self.consecutive_poll_failures = 0;
                self.apply_sample(StatusSample::from_payload(&payload));
            }
            Err(e) => {
                self.consecutive_poll_failures += 1;
                let message = format!(
                    "status poll failed ({} in a row): {}",
                    self.consecutive_poll_failures, e
                );
                if self.consecutive_poll_failures >= self.config.poll_failure_threshold {
                    self.diagnostics.error(&message);
                } else {
                    self.diagnostics.warn(&message);
                }
            }
        }
    }

    fn apply_sample(&mut self, sample: StatusSample) {
        if let Some(state) = sample.state.as_deref() {
            self.set_state(PlaybackState::from_remote(state));
        }

        self.position_secs = sample.position_secs;
        self.duration_secs = sample.duration_secs;
        self.emit(PlayerEvent::ProgressChanged(sample.position_secs));
        self.emit(PlayerEvent::DurationChanged(sample.duration_secs));
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        self.state = state.clone();
        self.emit(PlayerEvent::StateChanged(state));
    }

    fn report(&self, error: PlayerError) {
        self.diagnostics.warn(&error.to_string());
        self.emit(PlayerEvent::ErrorOccurred(error.to_string()));
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session.session_id().cloned(),
            registering: self.session.is_pending(),
            state: self.state.clone(),
            source: self.source.clone(),
            position_secs: self.position_secs,
            duration_secs: self.duration_secs,
            polling: self.ticker.is_some(),
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
