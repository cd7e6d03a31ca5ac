use std::collections::VecDeque;

use ivy_chat_protocol::StreamEvent;

use super::{Chunks, ChunksError, FrameDecoder};

/// A type for reading decoded stream events from a chunk stream.
pub struct EventReader {
    chunks: Chunks,
    decoder: FrameDecoder,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

impl EventReader {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            chunks,
            decoder: FrameDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Returns the next event, reading more chunks as needed.
    ///
    /// The last event of a stream that closed normally is
    /// [`StreamEvent::End`], after which `None` is returned.
    pub async fn next_event(
        &mut self,
    ) -> Result<Option<StreamEvent>, ChunksError> {
        loop {
            // Events decoded from an earlier chunk go first.
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }

            match self.chunks.next_chunk().await? {
                Some(chunk) => {
                    trace!("got chunk of {} bytes", chunk.len());
                    self.pending.extend(self.decoder.push(&chunk));
                }
                None => {
                    self.finished = true;
                    self.pending.push_back(self.decoder.finish());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn test_normal_events() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data: {\"type\":\"content\",\"content\":\"Hi\"}\n"),
                Bytes::from_static(b"data: {\"type\":\"content\",\"content\":\" there\"}\n"),
            ]
            .into(),
        );
        let mut reader = EventReader::new(chunks);
        assert_eq!(
            reader.next_event().await.unwrap(),
            Some(StreamEvent::Content("Hi".to_owned()))
        );
        assert_eq!(
            reader.next_event().await.unwrap(),
            Some(StreamEvent::Content(" there".to_owned()))
        );
        assert_eq!(reader.next_event().await.unwrap(), Some(StreamEvent::End));
        assert_eq!(reader.next_event().await.unwrap(), None);
        assert_eq!(reader.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let chunks = Chunks::from_vec_deque(
            vec![
                Bytes::from_static(b"data:"),
                Bytes::from_static(b" {\"type\":\"content\","),
                Bytes::from_static(b"\"content\":\"Hi\"}"),
                Bytes::from_static(b"\n"),
            ]
            .into(),
        );
        let mut reader = EventReader::new(chunks);
        assert_eq!(
            reader.next_event().await.unwrap(),
            Some(StreamEvent::Content("Hi".to_owned()))
        );
        assert_eq!(reader.next_event().await.unwrap(), Some(StreamEvent::End));
    }

    #[tokio::test]
    async fn test_broken_transport() {
        let chunks = Chunks::broken_after(
            vec![Bytes::from_static(
                b"data: {\"type\":\"content\",\"content\":\"Hi\"}\n",
            )]
            .into(),
        );
        let mut reader = EventReader::new(chunks);
        assert_eq!(
            reader.next_event().await.unwrap(),
            Some(StreamEvent::Content("Hi".to_owned()))
        );
        assert!(reader.next_event().await.is_err());
    }
}
