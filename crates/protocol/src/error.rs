use std::fmt::{self, Display};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request could not be sent, or the connection broke while the
    /// response was streaming.
    Network,
    /// The server answered with a non-success status.
    Status,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::Status => write!(f, "Unexpected status"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}
