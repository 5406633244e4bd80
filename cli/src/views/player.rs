use std::io;
use std::sync::Arc;
use crossterm::event::{ KeyCode, KeyEvent };
use ratatui::{
  layout::Alignment,
  style::{ Color, Style },
  text::Text,
  widgets::Paragraph,
  Frame,
};
use tokio::runtime::Handle;
use webos_media::{ PlayerController, PlayerError };

use crate::state::reducers::AppAction;
use crate::state::store::Store;
use crate::widgets::{ progress, util };

use super::View;

const SEEK_STEP_SECS: u64 = 10;
const HELP: &str = "l load  space play/pause  s stop  \u{2190}/\u{2192} seek  q quit";

/// What `l` loads
#[derive(Debug, Clone)]
pub enum LoadTarget {
  Video(String),
  Url { url: String, mime_type: String, is_live: bool },
}

pub struct PlayerView {
  store: Arc<Store>,
  controller: PlayerController,
  target: LoadTarget,
  runtime: Handle,
}

impl PlayerView {
  pub fn new(store: Arc<Store>, controller: PlayerController, target: LoadTarget, runtime: Handle) -> Self {
    Self { store, controller, target, runtime }
  }

  fn load(&mut self, store: &Store) -> Result<(), PlayerError> {
    match self.target.clone() {
      LoadTarget::Video(video_id) => {
        store.dispatch(AppAction::SetStatusMessage(format!("Resolving {}", video_id)));
        self.runtime.block_on(self.controller.load(&video_id))?;
        if let Some(source) = self.controller.current_source() {
          store.dispatch(AppAction::SetSource { label: source.url.clone(), is_live: source.is_live });
        }
      }
      LoadTarget::Url { url, mime_type, is_live } => {
        self.controller.load_from_url(&url, &mime_type, is_live)?;
        store.dispatch(AppAction::SetSource { label: url, is_live });
      }
    }
    Ok(())
  }

  fn toggle_playback(&mut self, store: &Store) -> Result<(), PlayerError> {
    if store.with_state(|state| state.playback.is_playing()) {
      self.controller.pause()
    } else {
      self.controller.play()
    }
  }

  fn seek_by(&self, store: &Store, forward: bool) -> Result<(), PlayerError> {
    let target = store.with_state(|state| {
      if forward {
        let next = state.position_secs.saturating_add(SEEK_STEP_SECS);
        if state.duration_secs > 0 { next.min(state.duration_secs) } else { next }
      } else {
        state.position_secs.saturating_sub(SEEK_STEP_SECS)
      }
    });
    self.controller.seek(target)
  }

  fn lines(&self) -> (String, String, String) {
    self.store.with_state(|state| {
      let source = state.source.clone().unwrap_or_else(|| "No source".to_string());
      let status = match &state.last_error {
        Some(error) => format!("{} | {}", state.status_message, error),
        None => state.status_message.clone(),
      };
      (source, state.playback.to_string(), status)
    })
  }
}

impl View for PlayerView {
  fn render(&mut self, frame: &mut Frame) {
    let (source, playback, status) = self.lines();
    let (position, duration, is_live, has_error) = self.store.with_state(|state| {
      (state.position_secs, state.duration_secs, state.is_live, state.last_error.is_some())
    });

    let rows = util::centered_rows(frame.area(), &[1, 1, 3, 1, 1]);

    frame.render_widget(Paragraph::new(Text::from(source)).alignment(Alignment::Center), rows[0]);
    frame.render_widget(Paragraph::new(Text::from(playback.to_uppercase())).alignment(Alignment::Center), rows[1]);
    frame.render_widget(
      progress::progress_gauge(position, duration, is_live),
      util::horizontally_centered(rows[2], 60),
    );

    let status_style = if has_error { Style::default().fg(Color::Red) } else { Style::default() };
    frame.render_widget(
      Paragraph::new(Text::from(status)).style(status_style).alignment(Alignment::Center),
      rows[3],
    );
    frame.render_widget(
      Paragraph::new(Text::from(HELP)).style(Style::default().fg(Color::DarkGray)).alignment(Alignment::Center),
      rows[4],
    );
  }

  fn handle_input(&mut self, key_event: KeyEvent, store: &Store) -> io::Result<()> {
    let result = match key_event.code {
      KeyCode::Char('l') => self.load(store),
      KeyCode::Char(' ') => self.toggle_playback(store),
      KeyCode::Char('s') => self.controller.stop(),
      KeyCode::Left => self.seek_by(store, false),
      KeyCode::Right => self.seek_by(store, true),
      KeyCode::Esc => {
        store.dispatch(AppAction::DismissError);
        Ok(())
      }
      _ => Ok(()),
    };
    result.map_err(io::Error::other)
  }
}
