//! Transcript-related types.

use serde::Serialize;

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the client.
    User,
    /// The assistant on the other end of the stream.
    Bot,
}

/// A message in the transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    content: String,
    sender: Sender,
}

impl Message {
    /// Creates a message written by the user.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            sender: Sender::User,
        }
    }

    /// Creates a message written by the bot.
    #[inline]
    pub fn bot<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            sender: Sender::Bot,
        }
    }

    /// Returns the content of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the sender of this message.
    #[inline]
    pub fn sender(&self) -> Sender {
        self.sender
    }
}

/// An ordered list of messages.
///
/// Messages are only appended, except that the bot message currently being
/// streamed may be replaced or retracted by the controller.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Returns all messages in order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message and returns its index.
    pub(crate) fn push(&mut self, msg: Message) -> usize {
        self.messages.push(msg);
        self.messages.len() - 1
    }

    /// Replaces the message at `idx` with a bot message of `content`.
    pub(crate) fn replace_bot_content(&mut self, idx: usize, content: String) {
        debug_assert_eq!(self.messages[idx].sender, Sender::Bot);
        self.messages[idx] = Message::bot(content);
    }

    pub(crate) fn remove(&mut self, idx: usize) -> Message {
        self.messages.remove(idx)
    }
}

impl FromIterator<Message> for Transcript {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
