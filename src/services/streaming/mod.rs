//! Streaming assembly and UI update batching

mod buffer;

pub use buffer::{MessageTarget, StreamAssembler, StreamingBuffer};
