//! A chat backend that streams responses over HTTP.
//!
//! Each user turn is posted as JSON, and the response body is read as
//! newline-delimited `data: <json>` records.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use ivy_chat_protocol::{BackendError, ChatBackend, ChatRequest, ErrorKind};
use mime::Mime;
use reqwest::{Client, Response, header};

pub use config::{ChatConfig, ChatConfigBuilder};
use io::{Chunks, EventReader};
pub use response::HttpEventStream;

/// Error type for [`HttpBackend`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// HTTP chat backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: Arc<ChatConfig>,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` with the given configuration.
    #[inline]
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatBackend for HttpBackend {
    type Error = Error;
    type Stream = HttpEventStream;

    fn send_message(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static
    {
        let url = self.config.endpoint_url();
        debug!("posting message to {url}");
        let resp_fut = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "text/event-stream")
            .json(req)
            .send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), ErrorKind::Network));
                }
            };
            let resp = match resp.error_for_status() {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), ErrorKind::Status));
                }
            };
            check_content_type(&resp);

            // Here we got a successful response.
            let chunks = Chunks::from_response(resp);
            Ok(HttpEventStream::from_reader(EventReader::new(chunks)))
        }
    }
}

fn check_content_type(resp: &Response) {
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let is_text = content_type
        .and_then(|v| v.parse().ok())
        .map(|m: Mime| m.type_() == mime::TEXT)
        .unwrap_or(false);
    if !is_text {
        warn!("unexpected content type: {content_type:?}, reading anyway");
    }
}
