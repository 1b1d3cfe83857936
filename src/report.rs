//! Run reports
//!
//! After a run the executor hands the case and its result to a
//! [`ReportEmitter`]. The HTML emitter writes one self-contained file per run.

use std::fmt::Write as _;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::model::{ExecutionResult, RunStatus, TestCase};

/// Renders a finished run somewhere a human can read it
#[async_trait]
pub trait ReportEmitter: Send + Sync {
    /// Write the report and return where it went
    async fn emit(&self, case: &TestCase, result: &ExecutionResult) -> Result<PathBuf>;
}

/// Writes `<dir>/<testCaseId>-<timestamp>.html`
#[derive(Debug, Clone)]
pub struct HtmlReportEmitter {
    dir: PathBuf,
}

impl HtmlReportEmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Emitter for the configured reports directory, if reports are enabled
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .report
            .enabled
            .then(|| Self::new(config.reports_dir()))
    }
}

#[async_trait]
impl ReportEmitter for HtmlReportEmitter {
    async fn emit(&self, case: &TestCase, result: &ExecutionResult) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::FileWrite {
                path: self.dir.display().to_string(),
                error: e.to_string(),
            })?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
        let path = self
            .dir
            .join(format!("{}-{}.html", result.test_case_id, stamp));

        tokio::fs::write(&path, render_html(case, result))
            .await
            .map_err(|e| Error::FileWrite {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;

        tracing::debug!(path = %path.display(), "Wrote run report");
        Ok(path)
    }
}

/// Render a run as a standalone HTML page
pub fn render_html(case: &TestCase, result: &ExecutionResult) -> String {
    let total = result.executed_steps.len();
    let passed = result.passed_count();
    let failed = total - passed;
    let status_class = match result.status {
        RunStatus::Passed => "passed",
        RunStatus::Failed => "failed",
    };

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape(&case.name));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    let _ = writeln!(
        html,
        "<h1>{} <span class=\"status {}\">{}</span></h1>",
        escape(&case.name),
        status_class,
        result.status
    );
    let _ = writeln!(
        html,
        "<p class=\"meta\">Test case <code>{}</code> against <a href=\"{url}\">{url}</a></p>",
        escape(&case.id),
        url = escape(&case.base_url)
    );
    let _ = writeln!(
        html,
        "<p class=\"summary\">{} steps, {} passed, {} failed in {:.2}s</p>",
        total,
        passed,
        failed,
        result.duration_ms as f64 / 1000.0
    );

    if let Some(error) = &result.error {
        let _ = writeln!(html, "<pre class=\"error\">{}</pre>", escape(error));
    }

    html.push_str("<ol class=\"steps\">\n");
    for (index, step) in result.executed_steps.iter().enumerate() {
        let _ = write!(
            html,
            "<li class=\"step {}\"><strong>{}</strong> step {} <span class=\"duration\">{}ms</span>",
            step.status,
            escape(&step.step_type),
            index + 1,
            step.duration_ms
        );
        if let Some(error) = &step.error {
            let _ = write!(html, "<pre class=\"error\">{}</pre>", escape(error));
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ol>\n</body>\n</html>\n");

    html
}

const STYLE: &str = "<style>
body { font-family: sans-serif; margin: 2em; }
.status.passed, .step.passed strong { color: #1a7f37; }
.status.failed, .step.failed strong { color: #cf222e; }
.duration, .meta { color: #656d76; }
pre.error { background: #fff1f0; padding: 0.5em; white-space: pre-wrap; }
</style>
";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTestCase, StepOutcome};

    fn sample() -> (TestCase, ExecutionResult) {
        let case = TestCase::create(NewTestCase {
            name: "Login <admin>".into(),
            base_url: "https://app.test/?a=1&b=2".into(),
            steps: vec![],
        })
        .unwrap();
        let result = ExecutionResult {
            status: RunStatus::Failed,
            test_case_id: case.id.clone(),
            duration_ms: 2346,
            error: Some("Step failed [tap]: button \"Go\" not found".into()),
            report_path: None,
            executed_steps: vec![
                StepOutcome {
                    step_id: "a".into(),
                    step_type: "input".into(),
                    status: RunStatus::Passed,
                    duration_ms: 300,
                    error: None,
                },
                StepOutcome {
                    step_id: "b".into(),
                    step_type: "tap".into(),
                    status: RunStatus::Failed,
                    duration_ms: 2000,
                    error: Some("button \"Go\" not found".into()),
                },
            ],
        };
        (case, result)
    }

    #[test]
    fn test_render_escapes_and_summarizes() {
        let (case, result) = sample();
        let html = render_html(&case, &result);

        assert!(html.contains("Login &lt;admin&gt;"));
        assert!(!html.contains("<admin>"));
        assert!(html.contains("https://app.test/?a=1&amp;b=2"));
        assert!(html.contains("2 steps, 1 passed, 1 failed in 2.35s"));
        assert!(html.contains("button &quot;Go&quot; not found"));
        assert!(html.contains("<li class=\"step failed\"><strong>tap</strong> step 2"));
    }

    #[tokio::test]
    async fn test_emit_writes_file_named_after_case() {
        let dir = tempfile::tempdir().unwrap();
        let emitter = HtmlReportEmitter::new(dir.path().join("reports"));
        let (case, result) = sample();

        let path = emitter.emit(&case, &result).await.unwrap();

        assert!(path.starts_with(dir.path().join("reports")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&case.id));
        assert!(name.ends_with(".html"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("status failed"));
    }

    #[tokio::test]
    async fn test_emit_failure_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let emitter = HtmlReportEmitter::new(blocker.join("reports"));
        let (case, result) = sample();

        let err = emitter.emit(&case, &result).await.unwrap_err();

        assert!(matches!(err, Error::FileWrite { .. }), "{:?}", err);
        assert!(err.to_string().starts_with("Failed to write file"));
    }

    #[test]
    fn test_disabled_reports_have_no_emitter() {
        let config = Config::parse("[report]\nenabled = false\n").unwrap();
        assert!(HtmlReportEmitter::from_config(&config).is_none());
    }
}
