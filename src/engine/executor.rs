//! Test case execution
//!
//! [`Executor::run`] loads a case, resolves the model configuration, opens
//! a browser session, navigates to the base URL and then runs the declared
//! steps in order, stopping at the first failure. The session is closed on
//! every path, and every failure ends up in the returned
//! [`ExecutionResult`] rather than as an error.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::driver::{Agent, BrowserLauncher, LaunchOptions, Page, ProcessLauncher, Viewport};
use crate::model::{ExecutionResult, RunStatus, Step, StepOutcome, TestCase};
use crate::report::{HtmlReportEmitter, ReportEmitter};
use crate::resolver::ConfigResolver;
use crate::store::{CaseStore, FsStore};

use super::agent_env::{agent_env, is_vision_grounded};
use super::session::{BrowserSession, SessionOptions};
use super::step::{execute_step, StepDefaults};

/// Knobs for a run
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorOptions {
    pub session: SessionOptions,
    pub steps: StepDefaults,
}

impl ExecutorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            session: SessionOptions {
                launch: LaunchOptions {
                    headless: config.browser.headless,
                },
                viewport: Viewport {
                    width: config.browser.viewport_width,
                    height: config.browser.viewport_height,
                },
            },
            steps: StepDefaults {
                wait_for_timeout_ms: config.timeouts.wait_for_ms,
            },
        }
    }
}

/// What a run has gathered so far; survives an aborted run
#[derive(Default)]
struct RunState {
    case: Option<TestCase>,
    executed: Vec<StepOutcome>,
    agent_report: Option<PathBuf>,
}

/// Runs stored test cases against a browser
pub struct Executor {
    store: Arc<dyn CaseStore>,
    resolver: ConfigResolver,
    launcher: Arc<dyn BrowserLauncher>,
    reporter: Option<Arc<dyn ReportEmitter>>,
    options: ExecutorOptions,
}

impl Executor {
    pub fn new(store: Arc<dyn CaseStore>, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            resolver: ConfigResolver::new(store.clone()),
            store,
            launcher,
            reporter: None,
            options: ExecutorOptions::default(),
        }
    }

    /// Executor wired to the on-disk store, the driver bridge and HTML reports
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn CaseStore> = Arc::new(FsStore::from_config(config));
        let launcher = Arc::new(ProcessLauncher::from_config(config));

        let mut executor = Self::new(store, launcher).with_options(ExecutorOptions::from_config(config));
        if let Some(emitter) = HtmlReportEmitter::from_config(config) {
            executor = executor.with_reporter(Arc::new(emitter));
        }
        executor
    }

    pub fn with_resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ReportEmitter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.options = options;
        self
    }

    /// Run a test case to completion
    #[tracing::instrument(skip_all, fields(test_case_id = %id))]
    pub async fn run(&self, id: &str) -> ExecutionResult {
        self.run_inner(id, None).await
    }

    /// Run a test case, giving up once `deadline` has passed
    ///
    /// On expiry the in-flight call is abandoned and the session is torn
    /// down as on any other failure.
    #[tracing::instrument(skip_all, fields(test_case_id = %id, deadline_ms = deadline.as_millis() as u64))]
    pub async fn run_with_deadline(&self, id: &str, deadline: Duration) -> ExecutionResult {
        self.run_inner(id, Some(deadline)).await
    }

    async fn run_inner(&self, id: &str, deadline: Option<Duration>) -> ExecutionResult {
        let started = Instant::now();
        let mut session = BrowserSession::new();
        let mut state = RunState::default();

        let outcome = match deadline {
            None => self.execute(id, &mut session, &mut state).await,
            Some(limit) => {
                match tokio::time::timeout(limit, self.execute(id, &mut session, &mut state)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(Error::RunDeadline(limit)),
                }
            }
        };

        session.close().await;

        let mut result = ExecutionResult {
            status: if outcome.is_ok() {
                RunStatus::Passed
            } else {
                RunStatus::Failed
            },
            test_case_id: id.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
            report_path: state.agent_report,
            executed_steps: state.executed,
        };

        match &result.error {
            None => tracing::info!(
                steps = result.executed_steps.len(),
                duration_ms = result.duration_ms,
                "Test case passed"
            ),
            Some(error) => tracing::info!(
                steps = result.executed_steps.len(),
                duration_ms = result.duration_ms,
                "Test case failed: {}",
                error
            ),
        }

        if let (Some(reporter), Some(case)) = (&self.reporter, &state.case) {
            match reporter.emit(case, &result).await {
                Ok(path) => {
                    result.report_path.get_or_insert(path);
                }
                Err(e) => tracing::warn!("Failed to write run report: {}", e),
            }
        }

        result
    }

    async fn execute(
        &self,
        id: &str,
        session: &mut BrowserSession,
        state: &mut RunState,
    ) -> Result<()> {
        let case = self
            .store
            .get_test_case(id)
            .await?
            .ok_or_else(|| Error::TestCaseNotFound(id.to_string()))?;
        let case = state.case.insert(case);

        let config = self
            .resolver
            .resolve()
            .await?
            .ok_or(Error::ModelConfigNotFound)?;

        tracing::info!(
            name = %case.name,
            steps = case.steps.len(),
            model = %config.model_name,
            vision_grounded = is_vision_grounded(&config),
            "Running test case"
        );

        session
            .open(self.launcher.as_ref(), &self.options.session)
            .await?;
        let page = session.page()?;

        let mut agent = page
            .attach_agent(&agent_env(&config))
            .await
            .map_err(|e| Error::session_acquisition("agent", &e))?;

        let outcome = match page.goto(&case.base_url).await {
            Ok(()) => {
                self.execute_steps(agent.as_mut(), page, &case.steps, &mut state.executed)
                    .await
            }
            Err(e) => Err(Error::Navigation {
                url: case.base_url.clone(),
                message: e.to_string(),
            }),
        };

        state.agent_report = agent.report_file().await;
        outcome
    }

    async fn execute_steps(
        &self,
        agent: &mut dyn Agent,
        page: &dyn Page,
        steps: &[Step],
        executed: &mut Vec<StepOutcome>,
    ) -> Result<()> {
        for (index, step) in steps.iter().enumerate() {
            let report = execute_step(agent, page, step, &self.options.steps).await;

            let duration_ms = report.duration.as_millis() as u64;
            let status = if report.passed() {
                RunStatus::Passed
            } else {
                RunStatus::Failed
            };
            tracing::debug!(index, kind = %step.kind, %status, duration_ms, "Step finished");

            executed.push(StepOutcome {
                step_id: step.id.clone(),
                step_type: step.kind.to_string(),
                status,
                duration_ms,
                error: report.error.clone(),
            });

            if let Some(message) = report.error {
                return Err(Error::step_failed(step.kind.as_str(), &message));
            }
        }
        Ok(())
    }
}
