//! Chat message processing: command grammar, routing and rendering

pub mod grammar;
pub mod processor;
pub mod render;

pub use grammar::{parse, Command};
pub use processor::{Action, ChatOutcome, ChatProcessor, DEFAULT_KB_NAME};
