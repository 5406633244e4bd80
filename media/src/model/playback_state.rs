/// Local playback state of a media session
///
/// States reported by the service outside the known set are kept verbatim
/// in `Other` so change detection compares exactly what was reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loaded,
    Playing,
    Paused,
    Stopped,
    Error,
    Other(String),
}

impl PlaybackState {
    /// Maps a state string from a status reply
    pub fn from_remote(state: &str) -> Self {
        match state {
            "idle" => PlaybackState::Idle,
            "loaded" => PlaybackState::Loaded,
            "playing" => PlaybackState::Playing,
            "paused" => PlaybackState::Paused,
            "stopped" => PlaybackState::Stopped,
            "error" => PlaybackState::Error,
            other => PlaybackState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loaded => "loaded",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Error => "error",
            PlaybackState::Other(state) => state,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
