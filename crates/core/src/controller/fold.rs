use ivy_chat_protocol::{Action, StreamEvent};

use super::Snapshot;
use crate::transcript::Message;

/// The bot message appended when a turn fails without the server saying
/// why.
pub const FAILURE_NOTICE: &str =
    "Sorry, there was an error processing your request.";

/// Per-turn streaming state. A fresh one is created for every submission.
#[derive(Debug, Default)]
pub struct TurnState {
    accumulated: String,
    booking_triggered: bool,
    // Index of the bot message this turn is streaming into, if any. The
    // message is tracked by position rather than by content, since an
    // earlier bot message may well have the same text.
    in_progress: Option<usize>,
    // Set once the user has been shown an error for this turn.
    terminated: bool,
}

impl TurnState {
    /// Folds one event into the snapshot. Returns `true` if the snapshot
    /// changed.
    pub fn apply(&mut self, snapshot: &mut Snapshot, event: StreamEvent) -> bool {
        if self.terminated {
            trace!("turn has terminated, ignoring {event:?}");
            return false;
        }

        match event {
            StreamEvent::Content(text) => {
                if self.booking_triggered {
                    // Booking supersedes any further prose in this turn.
                    return false;
                }
                self.accumulated.push_str(&text);
                let content = self.accumulated.clone();
                match self.in_progress {
                    Some(idx) => {
                        snapshot.transcript.replace_bot_content(idx, content);
                    }
                    None => {
                        let idx = snapshot.transcript.push(Message::bot(content));
                        self.in_progress = Some(idx);
                    }
                }
                true
            }
            StreamEvent::Action(Action::Booking) => {
                if self.booking_triggered {
                    return false;
                }
                self.booking_triggered = true;
                if let Some(idx) = self.in_progress.take() {
                    let retracted = snapshot.transcript.remove(idx);
                    debug!("retracted partial answer: {:?}", retracted.content());
                }
                snapshot.show_booking = true;
                true
            }
            StreamEvent::Error(text) => {
                self.in_progress = None;
                self.terminated = true;
                snapshot.transcript.push(Message::bot(text));
                true
            }
            StreamEvent::End => false,
        }
    }

    /// Records a transport failure. Returns `true` if the snapshot changed.
    ///
    /// At most one error message is shown per turn, so nothing is added if
    /// the server already declared an error.
    pub fn fail(&mut self, snapshot: &mut Snapshot) -> bool {
        if self.terminated {
            return false;
        }
        self.in_progress = None;
        self.terminated = true;
        snapshot.transcript.push(Message::bot(FAILURE_NOTICE));
        true
    }
}
