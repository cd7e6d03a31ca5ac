use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};

use crate::backend::BackendError;

/// A side-channel directive delivered inline with the response prose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// The assistant hands the conversation off to the booking widget.
    Booking,
}

/// A decoded event from a response stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamEvent {
    /// A fragment to append to the accumulating bot response.
    Content(String),
    /// A side-channel directive.
    Action(Action),
    /// A terminal, user-visible error message declared by the server.
    Error(String),
    /// The transport has closed. This is never sent on the wire.
    End,
}

/// A streaming response from a chat backend.
pub trait EventStream: Sized + Send + 'static {
    /// The error type that may be returned by the stream.
    type Error: BackendError;

    /// Attempts to pull out the next event from the stream.
    ///
    /// # Return value
    ///
    /// There are several possible return values, each indicating a
    /// distinct stream state:
    ///
    /// - `Poll::Pending` means that this stream is still waiting for
    ///   the next event. Implementations will ensure that the current
    ///   task will be notified when the next event may be ready.
    /// - `Poll::Ready(Ok(Some(event)))` means the stream has an event
    ///   to deliver, and may produce further events on subsequent
    ///   `poll_next_event` calls. [`StreamEvent::End`] is delivered
    ///   exactly once, as the last event of a healthy stream.
    /// - `Poll::Ready(Ok(None))` means the stream has completed.
    /// - `Poll::Ready(Err(error))` means the transport failed while
    ///   the stream was being read.
    ///
    /// Calling this method after completion should always return `None`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<StreamEvent>, Self::Error>>;
}
