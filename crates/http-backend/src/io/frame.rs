use std::fmt::{self, Display};

use bytes::BytesMut;
use ivy_chat_protocol::StreamEvent;

use crate::proto::Payload;

/// The literal prefix of a decodable record.
const FRAME_MARKER: &[u8] = b"data: ";

/// Records longer than this are dropped without being buffered.
pub const MAX_RECORD_LEN: usize = 1 << 20;

#[derive(Debug)]
enum DecodeError {
    InvalidUtf8,
    InvalidPayload(serde_json::Error),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidUtf8 => write!(f, "record is not valid UTF-8"),
            DecodeError::InvalidPayload(err) => {
                write!(f, "invalid payload: {err}")
            }
        }
    }
}

/// Turns newline-delimited `data: <json>` records into stream events.
///
/// Chunks are fed as they arrive. Bytes after the last newline are kept
/// until a later chunk completes the record, so a record may be split at
/// any byte, including in the middle of a multi-byte character.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    // Bytes of `buf` already known to contain no newline.
    scanned: usize,
    // Set while skipping the rest of an oversized record.
    discarding: bool,
    max_record_len: usize,
}

impl Default for FrameDecoder {
    #[inline]
    fn default() -> Self {
        Self::with_max_record_len(MAX_RECORD_LEN)
    }
}

impl FrameDecoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_max_record_len(max_record_len: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            scanned: 0,
            discarding: false,
            max_record_len,
        }
    }

    /// Appends a chunk and returns the events of every record it completed,
    /// in arrival order.
    pub fn push(&mut self, mut chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = vec![];
        if self.discarding {
            let Some(eol_idx) = chunk.iter().position(|b| *b == b'\n') else {
                return events;
            };
            self.discarding = false;
            chunk = &chunk[eol_idx + 1..];
        }
        self.buf.extend_from_slice(chunk);

        while let Some(offset) =
            self.buf[self.scanned..].iter().position(|b| *b == b'\n')
        {
            let eol_idx = self.scanned + offset;
            let record = self.buf.split_to(eol_idx + 1);
            self.scanned = 0;
            if eol_idx > self.max_record_len {
                warn!("dropping record of {eol_idx} bytes");
                continue;
            }
            if let Some(event) = decode_record(&record[..eol_idx]) {
                events.push(event);
            }
        }
        self.scanned = self.buf.len();

        if self.buf.len() > self.max_record_len {
            warn!(
                "dropping record longer than {} bytes",
                self.max_record_len
            );
            self.buf.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        events
    }

    /// Ends the stream. An unterminated trailing record is discarded.
    pub fn finish(&mut self) -> StreamEvent {
        if !self.buf.is_empty() {
            debug!("discarding {} bytes of unterminated record", self.buf.len());
            self.buf.clear();
        }
        self.scanned = 0;
        self.discarding = false;
        StreamEvent::End
    }
}

fn decode_record(line: &[u8]) -> Option<StreamEvent> {
    // Keep-alives, comments and other fields are not records.
    let payload = line.strip_prefix(FRAME_MARKER)?;
    match decode_payload(payload) {
        Ok(event) => event,
        Err(err) => {
            warn!("dropping malformed record: {err}");
            None
        }
    }
}

fn decode_payload(payload: &[u8]) -> Result<Option<StreamEvent>, DecodeError> {
    let payload =
        str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?;
    let payload = serde_json::from_str::<Payload>(payload)
        .map_err(DecodeError::InvalidPayload)?;
    Ok(payload.into_event())
}
