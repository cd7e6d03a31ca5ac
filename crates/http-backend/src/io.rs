mod chunks;
mod frame;
mod reader;

pub use chunks::{Chunks, Error as ChunksError};
pub use frame::FrameDecoder;
pub use reader::EventReader;
