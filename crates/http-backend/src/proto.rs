use ivy_chat_protocol::{Action, StreamEvent};
use serde::Deserialize;

/// The action value that hands the conversation off to booking.
const BOOK_MEETING: &str = "BOOK_MEETING";

// ----------------------------
// Types received from the server
// ----------------------------

/// The JSON payload following the frame marker of a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Content {
        content: String,
    },
    Special {
        action: String,
    },
    Error {
        content: String,
    },
    // Newer servers may send record types we don't know about yet.
    #[serde(other)]
    Unknown,
}

// -----------
// Conversions
// -----------

impl Payload {
    /// Converts the payload into an event, or `None` if the payload
    /// carries nothing this client understands.
    pub fn into_event(self) -> Option<StreamEvent> {
        match self {
            Payload::Content { content } => Some(StreamEvent::Content(content)),
            Payload::Special { action } if action == BOOK_MEETING => {
                Some(StreamEvent::Action(Action::Booking))
            }
            Payload::Special { action } => {
                trace!("ignoring unknown action: {action}");
                None
            }
            Payload::Error { content } => Some(StreamEvent::Error(content)),
            Payload::Unknown => {
                trace!("ignoring unknown record type");
                None
            }
        }
    }
}
