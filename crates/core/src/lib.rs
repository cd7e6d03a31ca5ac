//! Core logic of the chat client: the transcript, the fold step that turns
//! stream events into transcript updates, and the controller driving turns.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod backend_client;
mod controller;
pub mod transcript;

pub use controller::{
    DEFAULT_BOOKING_URL, FAILURE_NOTICE, Snapshot, TranscriptController,
    TranscriptControllerBuilder,
};
