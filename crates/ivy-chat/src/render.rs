use ivy_chat_core::Snapshot;
use ivy_chat_core::transcript::Sender;
use owo_colors::OwoColorize;

const BAR_CHAR: &str = "▎";

/// Turns the stream of snapshots into terminal output.
///
/// The terminal can only be appended to, so the renderer remembers what it
/// has printed and emits just the difference for every new snapshot.
pub struct Renderer {
    booking_url: String,
    // Number of transcript messages already rendered.
    seen: usize,
    // The bot message whose line is still open: its index and the number
    // of bytes printed so far.
    open_line: Option<(usize, usize)>,
    booking_shown: bool,
}

impl Renderer {
    pub fn new<S: Into<String>>(booking_url: S) -> Self {
        Self {
            booking_url: booking_url.into(),
            seen: 0,
            open_line: None,
            booking_shown: false,
        }
    }

    /// Returns the text to print for `snapshot`.
    pub fn render(&mut self, snapshot: &Snapshot) -> String {
        let mut out = String::new();
        let messages = snapshot.transcript.messages();

        if messages.len() < self.seen {
            // The partial answer was withdrawn in favour of booking.
            self.close_line(&mut out);
            out.push_str(&format!("{}\n", "(answer withdrawn)".dimmed()));
            self.seen = messages.len();
        }

        if let Some((idx, printed)) = self.open_line {
            let rest = messages
                .get(idx)
                .and_then(|msg| msg.content().get(printed..));
            if let Some(rest) = rest {
                out.push_str(rest);
                self.open_line = Some((idx, printed + rest.len()));
            }
        }

        for (idx, msg) in messages.iter().enumerate().skip(self.seen) {
            self.close_line(&mut out);
            // User messages were typed at the prompt already.
            if msg.sender() == Sender::Bot {
                out.push_str(&format!(
                    "{}🤖 {}",
                    BAR_CHAR.bright_cyan(),
                    msg.content()
                ));
                self.open_line = Some((idx, msg.content().len()));
            }
        }
        self.seen = messages.len();

        if snapshot.show_booking && !self.booking_shown {
            self.close_line(&mut out);
            out.push_str(&format!(
                "{}📅 Book a time: {}\n",
                BAR_CHAR.bright_yellow(),
                self.booking_url.bright_white().underline()
            ));
            self.booking_shown = true;
        }

        if !snapshot.streaming {
            self.close_line(&mut out);
        }
        out
    }

    fn close_line(&mut self, out: &mut String) {
        if self.open_line.take().is_some() {
            out.push('\n');
        }
    }
}
