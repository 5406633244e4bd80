use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::command::PlayerHandle;
use super::event_loop::PlaybackSessionController;
use crate::config::PlayerConfig;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::{PlayerError, Result};
use crate::model::PlayerEvent;
use crate::transport::Transport;

/// Builder for a running playback controller
///
/// # Example
///
/// ```rust,no_run
/// # use webos_media::{PlayerBuilder, PlayerConfig, LunaSendTransport};
/// # async fn demo() -> webos_media::Result<()> {
/// let mut player = PlayerBuilder::new(LunaSendTransport::new())
///     .with_config(PlayerConfig::production())
///     .start()?;
///
/// player.handle().load_url("http://cdn/a.m3u8", "application/x-mpegurl", false)?;
/// while let Some(event) = player.next_event().await {
///     println!("{:?}", event);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PlayerBuilder {
    transport: Arc<dyn Transport>,
    config: PlayerConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl PlayerBuilder {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: PlayerConfig::default(),
            diagnostics: Arc::new(LogSink::default()),
        }
    }

    pub fn with_config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Validates the configuration and spawns the controller on the current tokio runtime
    pub fn start(self) -> Result<ActivePlayer> {
        self.config.validate().map_err(PlayerError::Config)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PlayerError::Config(format!("no tokio runtime: {}", e)))?;

        let (command_sender, commands) = mpsc::unbounded_channel();
        let (event_sender, events) = mpsc::unbounded_channel();

        let (controller, completions) = PlaybackSessionController::new(
            self.transport,
            self.config,
            self.diagnostics,
            event_sender.clone(),
        );
        let task = runtime.spawn(controller.run(commands, completions));

        Ok(ActivePlayer {
            handle: PlayerHandle::new(command_sender, event_sender),
            events,
            task,
        })
    }
}

/// A running playback controller together with its event stream
pub struct ActivePlayer {
    handle: PlayerHandle,
    events: mpsc::UnboundedReceiver<PlayerEvent>,
    task: JoinHandle<()>,
}

impl ActivePlayer {
    /// Handle for issuing commands; clones drive the same session
    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    pub async fn next_event(&mut self) -> Option<PlayerEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<PlayerEvent> {
        self.events.try_recv().ok()
    }

    /// Every event already emitted and not yet received
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Splits into the command handle and the raw event receiver
    ///
    /// The controller keeps running until every handle is dropped.
    pub fn into_parts(self) -> (PlayerHandle, mpsc::UnboundedReceiver<PlayerEvent>) {
        (self.handle, self.events)
    }

    /// Tears the session down and waits for the controller task to finish
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown()?;
        self.task
            .await
            .map_err(|e| PlayerError::Config(format!("controller task failed: {}", e)))
    }
}
