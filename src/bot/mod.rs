//! Bot module tying the lookup pipeline to chat delivery

pub mod handler;
pub mod pipeline;

pub use handler::{Bot, USAGE};
pub use pipeline::{Pipeline, PipelineSummary, NO_VALID_INPUT};
