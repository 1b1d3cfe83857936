//! Execution result types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pass/fail verdict for a step or a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Recorded outcome of one attempted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step_id: String,
    pub step_type: String,
    pub status: RunStatus,
    /// Wall-clock milliseconds from dispatch to settle
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Terminal result of one run
///
/// `executed_steps` is always a prefix of the case's declared steps; the
/// implicit base-URL navigation is never listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub status: RunStatus,
    pub test_case_id: String,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    #[serde(default)]
    pub executed_steps: Vec<StepOutcome>,
}

impl ExecutionResult {
    pub fn passed(&self) -> bool {
        self.status == RunStatus::Passed
    }

    /// Number of executed steps that passed
    pub fn passed_count(&self) -> usize {
        self.executed_steps
            .iter()
            .filter(|s| s.status == RunStatus::Passed)
            .count()
    }

    /// The step that stopped the run, if any
    pub fn failed_step(&self) -> Option<&StepOutcome> {
        self.executed_steps
            .iter()
            .find(|s| s.status == RunStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_json_shape() {
        let result = ExecutionResult {
            status: RunStatus::Failed,
            test_case_id: "tc-1".into(),
            duration_ms: 1200,
            error: Some("Step failed [tap]: no such element".into()),
            report_path: None,
            executed_steps: vec![StepOutcome {
                step_id: "s1".into(),
                step_type: "tap".into(),
                status: RunStatus::Failed,
                duration_ms: 900,
                error: Some("no such element".into()),
            }],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["testCaseId"], "tc-1");
        assert_eq!(json["duration"], 1200);
        assert!(json.get("reportPath").is_none());
        assert_eq!(json["executedSteps"][0]["stepType"], "tap");
        assert_eq!(json["executedSteps"][0]["duration"], 900);
        assert_eq!(result.failed_step().map(|s| s.step_id.as_str()), Some("s1"));
        assert_eq!(result.passed_count(), 0);
    }
}
