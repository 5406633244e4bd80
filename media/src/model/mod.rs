mod playback_source;
mod playback_state;
mod player_event;
mod session_id;
mod status_sample;

pub use playback_source::PlaybackSource;
pub use playback_state::PlaybackState;
pub use player_event::PlayerEvent;
pub use session_id::SessionId;
pub use status_sample::StatusSample;
