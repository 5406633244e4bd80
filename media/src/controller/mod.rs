mod builder;
mod command;
mod event_loop;
mod session;

pub use builder::{ActivePlayer, PlayerBuilder};
pub use command::PlayerHandle;
pub use event_loop::PlaybackSessionController;
pub use session::SessionSnapshot;
