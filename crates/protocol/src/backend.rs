use std::error::Error;

use crate::error::ErrorKind;
use crate::event::EventStream;
use crate::request::ChatRequest;

/// The error type for a chat backend.
pub trait BackendError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a chat backend, which opens one event stream per
/// user turn.
///
/// Once the backend is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the backend should be prepared for being dropped anytime.
pub trait ChatBackend: Send + Sync {
    /// The error type that may be returned by the backend.
    type Error: BackendError;

    /// The event stream type for this backend.
    type Stream: EventStream<Error = Self::Error>;

    /// Sends a user message and resolves once the response starts
    /// streaming.
    ///
    /// Failing to connect, or receiving a non-success status, must be
    /// reported here rather than through the stream.
    fn send_message(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static;
}
