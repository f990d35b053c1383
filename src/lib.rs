pub mod actors;
pub mod config;
pub mod pipeline;
pub mod storage;
pub mod targets;

pub use actors::messages::{Measurement, Target};
pub use pipeline::Pipeline;
