//! Shared vocabulary between chat backends and the transcript controller.
//!
//! A backend turns one user message into a stream of [`StreamEvent`]s. The
//! transport, framing and payload format are all up to the backend; the
//! consumer only ever sees decoded events in arrival order.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod backend;
mod error;
mod event;
mod request;

pub use backend::*;
pub use error::*;
pub use event::*;
pub use request::*;
