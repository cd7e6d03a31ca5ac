//! A terminal chat client for an IVY chat server.

#[macro_use]
extern crate tracing;

mod config;
mod render;

use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use ivy_chat_core::{Snapshot, TranscriptControllerBuilder};
use ivy_chat_http::HttpBackend;
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

use config::Config;
use render::Renderer;

enum UiEvent {
    Snapshot(Snapshot),
    Idle,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    debug!("loaded config: {config:?}");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let controller =
        TranscriptControllerBuilder::with_backend(HttpBackend::new(config.chat))
            .with_booking_url(config.booking_url)
            .on_snapshot({
                let event_tx = event_tx.clone();
                move |snapshot| {
                    event_tx.send(UiEvent::Snapshot(snapshot.clone())).ok();
                }
            })
            .on_idle(move || {
                event_tx.send(UiEvent::Idle).ok();
            })
            .build();

    let mut renderer = Renderer::new(controller.booking_url());
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!("{}", "Ask anything. Press Ctrl-D to quit.".dimmed());

    'outer: loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        if !controller.submit(&line) {
            continue;
        }

        // The spinner only runs until the first piece of the answer shows
        // up, since it would clobber a half-printed line.
        let mut progress_bar = Some(new_spinner(&progress_style));

        loop {
            if let Some(progress_bar) = &progress_bar {
                progress_bar.inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let event = select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        break 'outer;
                    };
                    event
                },
                _ = sleep => {
                    continue;
                }
            };

            match event {
                UiEvent::Snapshot(snapshot) => {
                    let output = renderer.render(&snapshot);
                    if output.is_empty() {
                        continue;
                    }
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    print!("{output}");
                    std::io::stdout().flush().ok();
                }
                UiEvent::Idle => {
                    if let Some(progress_bar) = progress_bar.take() {
                        progress_bar.finish_and_clear();
                    }
                    break;
                }
            }
        }
    }
}

fn new_spinner(style: &ProgressStyle) -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(style.clone());
    progress_bar.set_message("💬 Thinking...");
    progress_bar
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
