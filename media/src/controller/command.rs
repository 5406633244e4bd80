use tokio::sync::{mpsc, oneshot};

use super::session::SessionSnapshot;
use crate::error::{PlayerError, Result};
use crate::model::{PlaybackSource, PlayerEvent};

/// Requests handled by the controller's event loop, in order of arrival
#[derive(Debug)]
pub(crate) enum Command {
    Load(PlaybackSource),
    Play,
    Pause,
    Seek(u64),
    Stop,
    Teardown(oneshot::Sender<()>),
    /// Acknowledged once every earlier command has been handled
    Settle(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    /// Ends the event loop, tearing the session down first
    Shutdown,
}

/// Cloneable handle used to drive a running playback controller
///
/// Command methods only queue the request and return immediately; the
/// outcome is reported through `PlayerEvent`s.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedSender<PlayerEvent>,
}

impl PlayerHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        Self { commands, events }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| PlayerError::Closed)
    }

    pub fn load(&self, source: PlaybackSource) -> Result<()> {
        self.send(Command::Load(source))
    }

    pub fn load_url(&self, url: impl Into<String>, mime_type: impl Into<String>, is_live: bool) -> Result<()> {
        self.load(PlaybackSource::from_url(url, mime_type, is_live))
    }

    pub fn play(&self) -> Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    /// Seeks to an absolute position in seconds
    pub fn seek(&self, position_secs: u64) -> Result<()> {
        self.send(Command::Seek(position_secs))
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Stops playback and releases the session. Safe to call repeatedly.
    pub async fn teardown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Teardown(ack))?;
        done.await.map_err(|_| PlayerError::Closed)
    }

    /// Resolves once every previously queued command has been handled
    pub async fn settled(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Settle(ack))?;
        done.await.map_err(|_| PlayerError::Closed)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, snapshot) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        snapshot.await.map_err(|_| PlayerError::Closed)
    }

    pub(crate) fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Surfaces an error from a layer above the controller on the same event stream
    pub(crate) fn report_error(&self, error: &PlayerError) {
        let _ = self.events.send(PlayerEvent::ErrorOccurred(error.to_string()));
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
