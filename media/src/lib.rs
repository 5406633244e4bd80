//! Playback session control for the webOS media service.
//!
//! `PlayerBuilder` starts a `PlaybackSessionController` that owns one media
//! session, issues load/play/pause/seek/stop over a `Transport`, polls the
//! service for status and reports `PlayerEvent`s. `PlayerController` sits on
//! top and resolves video ids into playable sources.

pub mod config;
pub mod controller;
pub mod delivery;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod player;
pub mod transport;

// Re-export key types for easier access
pub use config::PlayerConfig;
pub use controller::{ActivePlayer, PlaybackSessionController, PlayerBuilder, PlayerHandle, SessionSnapshot};
pub use delivery::{DeliveryConfig, DeliveryInfo, DeliveryResolver, HttpDeliveryResolver};
pub use diagnostics::{DiagnosticSink, LogSink};
pub use error::{PlayerError, Result, TransportError};
pub use model::{PlaybackSource, PlaybackState, PlayerEvent, SessionId, StatusSample};
pub use player::PlayerController;
pub use transport::{InMemoryMediaService, LunaSendTransport, Method, Transport};
