use ratatui::{
  style::{ Color, Style },
  widgets::{ Block, Borders, Gauge },
};

/// `m:ss`, or `h:mm:ss` past an hour
pub fn format_clock(secs: u64) -> String {
  let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
  if hours > 0 {
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
  } else {
    format!("{}:{:02}", minutes, seconds)
  }
}

pub fn progress_ratio(position_secs: u64, duration_secs: u64) -> f64 {
  if duration_secs == 0 {
    return 0.0;
  }
  (position_secs as f64 / duration_secs as f64).clamp(0.0, 1.0)
}

pub fn progress_gauge(position_secs: u64, duration_secs: u64, is_live: bool) -> Gauge<'static> {
  let label = if is_live {
    format!("LIVE {}", format_clock(position_secs))
  } else {
    format!("{} / {}", format_clock(position_secs), format_clock(duration_secs))
  };

  Gauge::default()
    .block(Block::default().borders(Borders::ALL))
    .gauge_style(Style::default().fg(Color::Cyan))
    .ratio(if is_live { 1.0 } else { progress_ratio(position_secs, duration_secs) })
    .label(label)
}
