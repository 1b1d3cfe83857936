//! Error types for webcase
//!
//! Messages are written to be shown as-is in a run result, so step and
//! capability failures keep the underlying text verbatim.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for webcase
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    #[error("Test case not found: {0}")]
    TestCaseNotFound(String),

    #[error("Stored document '{path}' is corrupt: {message}")]
    StoreCorrupt { path: String, message: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    // === Model Configuration Errors ===
    #[error("No model configuration found. Run 'webcase config set' or export MIDSCENE_MODEL_API_KEY, MIDSCENE_MODEL_BASE_URL and MIDSCENE_MODEL_NAME")]
    ModelConfigNotFound,

    // === Session Errors ===
    #[error("Failed to acquire browser session ({stage}): {message}")]
    SessionAcquisition { stage: String, message: String },

    #[error("Browser session is {0}, expected open")]
    SessionNotOpen(String),

    #[error("Failed to open base URL '{url}': {message}")]
    Navigation { url: String, message: String },

    #[error("Run exceeded its deadline of {0:?}")]
    RunDeadline(Duration),

    // === Step Errors ===
    #[error("Step failed [{kind}]: {message}")]
    StepFailed { kind: String, message: String },

    #[error("Unsupported step kind: {0}")]
    UnsupportedStepKind(String),

    /// Failure reported by the page agent; the text is passed through untouched
    #[error("{0}")]
    Capability(String),

    // === Driver Errors ===
    #[error("Browser driver failed to start: {0}")]
    DriverStartFailed(String),

    #[error("Browser driver exited unexpectedly")]
    DriverCrashed,

    #[error("Driver protocol error: {0}")]
    DriverProtocol(String),

    #[error("Driver request '{command}' timed out after {timeout:?}")]
    DriverTimeout { command: String, timeout: Duration },

    #[error("Driver stopped responding; '{0}' was not sent")]
    DriverUnresponsive(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a step failure attributed to a step kind
    pub fn step_failed(kind: &str, message: &str) -> Self {
        Self::StepFailed {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a session acquisition error for the stage that failed
    pub fn session_acquisition(stage: &str, source: &Error) -> Self {
        Self::SessionAcquisition {
            stage: stage.to_string(),
            message: source.to_string(),
        }
    }

    /// Create a corrupt document error
    pub fn store_corrupt(path: &std::path::Path, message: impl ToString) -> Self {
        Self::StoreCorrupt {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
