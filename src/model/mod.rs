//! Data model shared by the store, the engine and the CLI

mod model_config;
mod result;
mod test_case;

pub use model_config::{ModelConfiguration, NewModelConfiguration, DEFAULT_MODEL_FAMILY};
pub use result::{ExecutionResult, RunStatus, StepOutcome};
pub use test_case::{NewTestCase, Step, StepKind, StepParams, TestCase, TestCaseUpdate};
