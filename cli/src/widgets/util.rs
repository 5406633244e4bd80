use ratatui::layout::{ Constraint, Direction, Layout, Rect };

/// Stacks rows of the given heights in the vertical middle of `area`
pub fn centered_rows(area: Rect, heights: &[u16]) -> Vec<Rect> {
  let content: u16 = heights.iter().sum();
  let padding = area.height.saturating_sub(content) / 2;

  let outer = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(padding),
      Constraint::Length(content),
      Constraint::Min(0),
    ])
    .split(area);

  Layout::default()
    .direction(Direction::Vertical)
    .constraints(heights.iter().map(|h| Constraint::Length(*h)))
    .split(outer[1])
    .to_vec()
}

/// Horizontally inset `area` so it is at most `width` wide
pub fn horizontally_centered(area: Rect, width: u16) -> Rect {
  let width = width.min(area.width);
  Rect {
    x: area.x + (area.width - width) / 2,
    width,
    ..area
  }
}
