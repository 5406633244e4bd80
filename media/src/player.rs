use std::sync::Arc;

use crate::controller::PlayerHandle;
use crate::delivery::DeliveryResolver;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::{PlayerError, Result};
use crate::model::PlaybackSource;

/// Content-level entry point in front of the session controller
///
/// Turns a video id into a playable source through a `DeliveryResolver`,
/// or takes a raw URL, and attaches the source to the controller. Errors
/// from resolution are reported on the controller's event stream. The
/// returned `Result`s only fail once the controller has shut down.
pub struct PlayerController {
    player: PlayerHandle,
    resolver: Option<Arc<dyn DeliveryResolver>>,
    diagnostics: Arc<dyn DiagnosticSink>,
    current_source: Option<PlaybackSource>,
    attached: bool,
}

impl PlayerController {
    pub fn new(player: PlayerHandle) -> Self {
        Self {
            player,
            resolver: None,
            diagnostics: Arc::new(LogSink::default()),
            current_source: None,
            attached: false,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DeliveryResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn set_resolver(&mut self, resolver: Arc<dyn DeliveryResolver>) {
        self.resolver = Some(resolver);
    }

    pub fn current_source(&self) -> Option<&PlaybackSource> {
        self.current_source.as_ref()
    }

    /// Resolves `video_id` and loads the result
    pub async fn load(&mut self, video_id: &str) -> Result<()> {
        let Some(resolver) = self.resolver.clone() else {
            return self.report(PlayerError::ApiUnavailable);
        };

        match resolver.resolve(video_id).await {
            Ok(info) => {
                self.current_source = Some(info.into_source());
                self.attach()
            }
            Err(e) => self.report(e),
        }
    }

    pub fn load_from_url(&mut self, url: &str, mime_type: &str, is_live: bool) -> Result<()> {
        self.current_source = Some(PlaybackSource::from_url(url, mime_type, is_live));
        self.attach()
    }

    pub fn play(&mut self) -> Result<()> {
        if !self.attached {
            self.attach()?;
        }
        self.player.play()
    }

    pub fn pause(&self) -> Result<()> {
        if self.attached {
            self.player.pause()?;
        }
        Ok(())
    }

    pub fn seek(&self, position_secs: u64) -> Result<()> {
        if self.attached {
            self.player.seek(position_secs)?;
        }
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        if self.attached {
            self.player.stop()?;
        }
        Ok(())
    }

    fn attach(&mut self) -> Result<()> {
        self.attached = true;
        match &self.current_source {
            Some(source) if !source.url.is_empty() => self.player.load(source.clone()),
            _ => Ok(()),
        }
    }

    fn report(&self, error: PlayerError) -> Result<()> {
        if self.player.is_closed() {
            return Err(PlayerError::Closed);
        }
        self.diagnostics.warn(&error.to_string());
        self.player.report_error(&error);
        Ok(())
    }
}
