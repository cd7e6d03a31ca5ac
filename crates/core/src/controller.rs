mod builder;
mod fold;
mod state;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use crate::transcript::{Message, Transcript};
pub use builder::TranscriptControllerBuilder;
pub use fold::FAILURE_NOTICE;
use state::{Command, ControllerState, run_controller, update_snapshot};

/// The scheduling page revealed when the assistant hands off to booking.
pub const DEFAULT_BOOKING_URL: &str =
    "https://calendly.com/muizznaveed-internetworks/30min";

/// Everything the presentation layer renders, captured at one instant.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Messages in order.
    pub transcript: Transcript,
    /// Whether a turn is in flight. The input control should be disabled
    /// while this is set.
    pub streaming: bool,
    /// Whether the booking widget should be revealed.
    pub show_booking: bool,
}

/// Owns the transcript and drives one turn at a time against a chat
/// backend.
///
/// Turns are driven by a background task; this type is a cheap handle to
/// it. Every change is published as a new [`Snapshot`], both through the
/// `on_snapshot` callback and through [`TranscriptController::subscribe`].
#[derive(Clone)]
pub struct TranscriptController {
    cmd_tx: mpsc::UnboundedSender<Command>,
    snapshot_tx: Arc<watch::Sender<Snapshot>>,
    booking_url: Arc<str>,
}

impl TranscriptController {
    /// Submits a user message, returning whether it was accepted.
    ///
    /// Surrounding whitespace is trimmed, and empty input is ignored. The
    /// input is also ignored if a turn is still streaming; it is neither
    /// queued nor reported as an error.
    ///
    /// An accepted message is already in [`TranscriptController::snapshot`]
    /// when this returns, with `streaming` set. The answer arrives later.
    pub fn submit(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            trace!("ignoring empty input");
            return false;
        }

        let published = update_snapshot(&self.snapshot_tx, |snapshot| {
            if snapshot.streaming {
                return false;
            }
            snapshot.transcript.push(Message::user(text));
            snapshot.streaming = true;
            true
        });
        let Some(snapshot) = published else {
            debug!("a turn is still streaming, ignoring input");
            return false;
        };

        let cmd = Command::StartTurn {
            input: text.to_owned(),
            snapshot,
        };
        if self.cmd_tx.send(cmd).is_err() {
            error!("controller task has terminated");
        }
        true
    }

    /// Returns the latest snapshot.
    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Returns a receiver that observes every published snapshot.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Returns the URL the booking widget should be configured with.
    #[inline]
    pub fn booking_url(&self) -> &str {
        &self.booking_url
    }
}

impl TranscriptController {
    fn spawn_from_builder(builder: TranscriptControllerBuilder) -> Self {
        let TranscriptControllerBuilder {
            backend_client,
            booking_url,
            on_snapshot,
            on_idle,
        } = builder;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let snapshot_tx = Arc::new(watch::Sender::new(Snapshot::default()));
        let state = ControllerState::new(
            backend_client,
            Arc::clone(&snapshot_tx),
            on_snapshot,
            on_idle,
        );
        tokio::spawn(
            run_controller(state, cmd_rx, cmd_tx.downgrade())
                .instrument(debug_span!("controller")),
        );

        Self {
            cmd_tx,
            snapshot_tx,
            booking_url: booking_url
                .unwrap_or_else(|| DEFAULT_BOOKING_URL.to_owned())
                .into(),
        }
    }
}
