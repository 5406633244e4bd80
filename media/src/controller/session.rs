use std::collections::VecDeque;

use super::command::Command;
use crate::model::{PlaybackSource, PlaybackState, SessionId};
use crate::transport::ServiceHandle;

/// Registration state of the controller's media session
///
/// `Absent -> Pending -> Active`, back to `Absent` on teardown or when
/// registration fails. The connection is owned by the slot, so leaving
/// `Pending` or `Active` releases it.
#[derive(Debug, Default)]
pub(crate) enum SessionSlot {
    #[default]
    Absent,
    Pending(PendingRegistration),
    Active(ActiveSession),
}

/// A `register` call is in flight
#[derive(Debug)]
pub(crate) struct PendingRegistration {
    pub handle: ServiceHandle,
    /// Command that needed the session; replayed on success, dropped on failure
    pub trigger: Command,
    /// Commands queued while waiting, replayed in order either way
    pub deferred: VecDeque<Command>,
}

#[derive(Debug)]
pub(crate) struct ActiveSession {
    pub handle: ServiceHandle,
    pub id: SessionId,
}

impl SessionSlot {
    pub fn active(&self) -> Option<&ActiveSession> {
        match self {
            SessionSlot::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SessionSlot::Pending(_))
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.active().map(|session| &session.id)
    }
}

/// Point-in-time view of the controller's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub registering: bool,
    pub state: PlaybackState,
    pub source: Option<PlaybackSource>,
    pub position_secs: u64,
    pub duration_secs: u64,
    pub polling: bool,
}
