use webos_media::{PlaybackState, PlayerEvent};

use super::store::AppState;

#[derive(Debug)]
pub enum AppAction {
    Player(PlayerEvent),
    SetSource { label: String, is_live: bool },
    SetStatusMessage(String),
    DismissError,
}

pub fn app_reducer(state: &mut AppState, action: AppAction) {
    match action {
        AppAction::Player(PlayerEvent::StateChanged(playback)) => {
            log::debug!("StateChanged received: {}", playback);
            if playback == PlaybackState::Stopped {
                state.position_secs = 0;
            }
            state.status_message = playback.to_string();
            state.playback = playback;
        }
        AppAction::Player(PlayerEvent::ProgressChanged(position_secs)) => {
            state.position_secs = position_secs;
        }
        AppAction::Player(PlayerEvent::DurationChanged(duration_secs)) => {
            state.duration_secs = duration_secs;
        }
        AppAction::Player(PlayerEvent::ErrorOccurred(message)) => {
            log::debug!("ErrorOccurred received: {}", message);
            state.last_error = Some(message);
        }
        AppAction::SetSource { label, is_live } => {
            log::debug!("SetSource action received: {}", label);
            state.source = Some(label);
            state.is_live = is_live;
            state.position_secs = 0;
            state.duration_secs = 0;
            state.last_error = None;
        }
        AppAction::SetStatusMessage(message) => {
            state.status_message = message;
        }
        AppAction::DismissError => {
            state.last_error = None;
        }
    }
}
