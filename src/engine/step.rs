//! Step execution
//!
//! Maps one declared step onto one agent or page call and records how long
//! it took and how it failed. Nothing here returns an error to the caller:
//! every failure, including a panicking agent, comes back as data.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;

use crate::common::{Error, Result};
use crate::driver::{Agent, Page};
use crate::model::{Step, StepKind};

/// Defaults applied to steps that don't carry their own settings
#[derive(Debug, Clone, Copy)]
pub struct StepDefaults {
    pub wait_for_timeout_ms: u64,
}

impl Default for StepDefaults {
    fn default() -> Self {
        Self {
            wait_for_timeout_ms: 10_000,
        }
    }
}

/// What happened when a step ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub duration: Duration,
    /// Failure text, verbatim from the agent when it came from there
    pub error: Option<String>,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Run a single step against the page and its agent
pub async fn execute_step(
    agent: &mut dyn Agent,
    page: &dyn Page,
    step: &Step,
    defaults: &StepDefaults,
) -> StepReport {
    let started = Instant::now();
    tracing::debug!(step_id = %step.id, kind = %step.kind, "Executing step");

    let outcome = AssertUnwindSafe(dispatch(agent, page, step, defaults))
        .catch_unwind()
        .await;

    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(panic) => Some(panic_message(panic.as_ref())),
    };

    StepReport {
        duration: started.elapsed(),
        error,
    }
}

async fn dispatch(
    agent: &mut dyn Agent,
    page: &dyn Page,
    step: &Step,
    defaults: &StepDefaults,
) -> Result<()> {
    let params = &step.params;

    match &step.kind {
        StepKind::Tap => agent.tap(text(&params.target)).await,
        StepKind::Input => {
            agent
                .input(text(&params.value), text(&params.target))
                .await
        }
        StepKind::WaitFor => {
            let timeout_ms = params.timeout_ms.unwrap_or(defaults.wait_for_timeout_ms);
            agent.wait_for(text(&params.target), timeout_ms).await
        }
        StepKind::Assert => {
            let assertion = params.value.as_deref().or(params.target.as_deref());
            agent.assert_condition(assertion.unwrap_or("")).await
        }
        StepKind::Navigate => page.goto(text(&params.url)).await,
        StepKind::Unknown(tag) => Err(Error::UnsupportedStepKind(tag.clone())),
    }
}

/// Absent parameters go through as empty strings
fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "agent panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{AgentEnv, Page};
    use crate::engine::fakes::{FakeLauncher, Script};
    use crate::model::StepParams;

    async fn open_page(launcher: &FakeLauncher) -> (Box<dyn Page>, Box<dyn Agent>) {
        use crate::driver::{BrowserLauncher, LaunchOptions, Viewport};
        let mut browser = launcher.launch(&LaunchOptions::default()).await.unwrap();
        let mut context = browser.new_context(Viewport::default()).await.unwrap();
        let page = context.new_page().await.unwrap();
        let agent = page.attach_agent(&AgentEnv::new()).await.unwrap();
        (page, agent)
    }

    fn step(kind: StepKind, params: StepParams) -> Step {
        Step {
            id: "s".into(),
            kind,
            params,
        }
    }

    #[tokio::test]
    async fn test_parameter_mapping() {
        let launcher = FakeLauncher::new(Script::default());
        let (page, mut agent) = open_page(&launcher).await;
        let defaults = StepDefaults::default();

        let steps = [
            step(
                StepKind::Input,
                StepParams {
                    target: Some("search box".into()),
                    value: Some("rust".into()),
                    ..Default::default()
                },
            ),
            step(
                StepKind::WaitFor,
                StepParams {
                    target: Some("results shown".into()),
                    ..Default::default()
                },
            ),
            step(
                StepKind::WaitFor,
                StepParams {
                    target: Some("toast".into()),
                    timeout_ms: Some(500),
                    ..Default::default()
                },
            ),
            step(
                StepKind::Assert,
                StepParams {
                    target: Some("ignored target".into()),
                    value: Some("first result mentions rust".into()),
                    ..Default::default()
                },
            ),
            step(
                StepKind::Assert,
                StepParams {
                    target: Some("title visible".into()),
                    ..Default::default()
                },
            ),
            step(StepKind::Tap, StepParams::default()),
            step(
                StepKind::Navigate,
                StepParams {
                    url: Some("https://example.test/next".into()),
                    ..Default::default()
                },
            ),
        ];

        for s in &steps {
            let report = execute_step(agent.as_mut(), page.as_ref(), s, &defaults).await;
            assert!(report.passed(), "{:?}", report);
        }

        let calls = launcher.calls().all();
        let actions: Vec<&str> = calls
            .iter()
            .map(String::as_str)
            .filter(|c| !c.starts_with("launch") && !c.starts_with("new") && *c != "attach")
            .collect();
        assert_eq!(
            actions,
            vec![
                "input:rust|search box",
                "waitFor:results shown|10000",
                "waitFor:toast|500",
                "assert:first result mentions rust",
                "assert:title visible",
                "tap:",
                "goto:https://example.test/next",
            ]
        );
    }

    #[tokio::test]
    async fn test_agent_failure_is_captured_verbatim() {
        let launcher = FakeLauncher::new(Script::failing_on("tap", "Element 'Buy' not found"));
        let (page, mut agent) = open_page(&launcher).await;

        let report = execute_step(
            agent.as_mut(),
            page.as_ref(),
            &step(StepKind::Tap, StepParams::default()),
            &StepDefaults::default(),
        )
        .await;

        assert_eq!(report.error.as_deref(), Some("Element 'Buy' not found"));
    }

    #[tokio::test]
    async fn test_unknown_kind_fails_without_calling_agent() {
        let launcher = FakeLauncher::new(Script::default());
        let (page, mut agent) = open_page(&launcher).await;

        let report = execute_step(
            agent.as_mut(),
            page.as_ref(),
            &step(StepKind::Unknown("aiScroll".into()), StepParams::default()),
            &StepDefaults::default(),
        )
        .await;

        assert_eq!(
            report.error.as_deref(),
            Some("Unsupported step kind: aiScroll")
        );
        assert_eq!(launcher.calls().count("tap"), 0);
    }

    #[tokio::test]
    async fn test_panicking_agent_becomes_error() {
        let launcher = FakeLauncher::new(Script {
            panic_on: Some("assert".into()),
            ..Default::default()
        });
        let (page, mut agent) = open_page(&launcher).await;

        let report = execute_step(
            agent.as_mut(),
            page.as_ref(),
            &step(StepKind::Assert, StepParams::default()),
            &StepDefaults::default(),
        )
        .await;

        assert_eq!(report.error.as_deref(), Some("agent blew up on assert"));
    }
}
