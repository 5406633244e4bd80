use super::PlaybackState;

/// Events surfaced to the caller of the playback controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    /// Current position in whole seconds
    ProgressChanged(u64),
    /// Media duration in whole seconds
    DurationChanged(u64),
    ErrorOccurred(String),
}

impl PlayerEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, PlayerEvent::ErrorOccurred(_))
    }
}
