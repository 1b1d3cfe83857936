//! webcase - AI-driven browser test cases
//!
//! Test cases are ordered lists of natural-language browser steps. This
//! library stores them, resolves the AI model configuration and replays
//! them against a browser through an external driver bridge.

pub mod cli;
pub mod commands;
pub mod common;
pub mod driver;
pub mod engine;
pub mod model;
pub mod report;
pub mod resolver;
pub mod store;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use engine::Executor;
pub use model::{ExecutionResult, RunStatus, StepOutcome, TestCase};
