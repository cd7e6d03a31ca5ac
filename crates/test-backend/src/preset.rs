use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "content")]
    Content(String),
    #[serde(rename = "booking")]
    Booking,
    #[serde(rename = "error")]
    Error(String),
    /// The connection breaks at this point of the stream.
    #[serde(rename = "disconnect")]
    Disconnect,
}

/// The preset response for one user turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request is rejected before any event is streamed.
    pub rejected: bool,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejected: false,
        }
    }

    /// Creates a `PresetResponse` whose request is rejected.
    #[inline]
    pub fn rejected() -> Self {
        Self {
            events: vec![],
            rejected: true,
        }
    }
}
