use ivy_chat_protocol::ChatBackend;

use super::{Snapshot, TranscriptController};
use crate::backend_client::BackendClient;

/// [`TranscriptController`] builder.
pub struct TranscriptControllerBuilder {
    pub(crate) backend_client: BackendClient,
    pub(crate) booking_url: Option<String>,
    pub(crate) on_snapshot: Option<Box<dyn Fn(&Snapshot) + Send + Sync>>,
    pub(crate) on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl TranscriptControllerBuilder {
    /// Creates a new builder with the specified chat backend.
    #[inline]
    pub fn with_backend<B: ChatBackend + 'static>(backend: B) -> Self {
        Self {
            backend_client: BackendClient::new(backend),
            booking_url: None,
            on_snapshot: None,
            on_idle: None,
        }
    }

    /// Sets the URL of the booking widget.
    #[inline]
    pub fn with_booking_url<S: Into<String>>(mut self, url: S) -> Self {
        self.booking_url = Some(url.into());
        self
    }

    /// Attaches a callback to be invoked with every published snapshot.
    #[inline]
    pub fn on_snapshot(
        mut self,
        on_snapshot: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> Self {
        self.on_snapshot = Some(Box::new(on_snapshot));
        self
    }

    /// Attaches a callback to be invoked when a turn has settled.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the controller.
    ///
    /// This must be called within a tokio runtime.
    #[inline]
    pub fn build(self) -> TranscriptController {
        TranscriptController::spawn_from_builder(self)
    }
}
