use std::sync::{ Arc, Mutex, MutexGuard };
use webos_media::PlaybackState;

use super::reducers::{ self, AppAction };

pub struct AppState {
  pub playback: PlaybackState,
  pub position_secs: u64,
  pub duration_secs: u64,
  pub source: Option<String>,
  pub is_live: bool,
  pub last_error: Option<String>,
  pub status_message: String,
}

impl Default for AppState {
  fn default() -> Self {
    Self {
      playback: PlaybackState::Idle,
      position_secs: 0,
      duration_secs: 0,
      source: None,
      is_live: false,
      last_error: None,
      status_message: "Press l to load".to_string(),
    }
  }
}

pub struct Store {
  state: Arc<Mutex<AppState>>,
}

impl Store {
  pub fn new() -> Self {
    Self {
      state: Arc::new(Mutex::new(AppState::default())),
    }
  }

  fn lock(&self) -> MutexGuard<'_, AppState> {
    self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  pub fn dispatch(&self, action: AppAction) {
    let mut state = self.lock();
    reducers::app_reducer(&mut state, action);
  }

  pub fn with_state<F, T>(&self, f: F) -> T
  where
    F: FnOnce(&AppState) -> T
  {
    let state = self.lock();
    f(&state)
  }
}
