use serde::{Deserialize, Serialize};

/// A user turn to be sent to the chat backend.
///
/// This is also the JSON body of the request: `{ "message": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message, already trimmed.
    pub message: String,
}

impl ChatRequest {
    /// Creates a request carrying the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_body() {
        let body = serde_json::to_string(&ChatRequest::new("hello")).unwrap();
        assert_eq!(body, r#"{"message":"hello"}"#);
    }
}
