//! Test case execution engine

pub mod agent_env;
pub mod executor;
pub mod session;
pub mod step;

#[cfg(test)]
mod fakes;

pub use executor::{Executor, ExecutorOptions};
pub use session::{BrowserSession, SessionOptions, SessionState};
pub use step::{execute_step, StepDefaults, StepReport};
