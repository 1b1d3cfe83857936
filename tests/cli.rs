//! End-to-end tests for the webcase CLI
//!
//! Each test writes a settings file pointing the store at a temp directory
//! and the driver at the `mock_driver` binary, then runs `webcase` itself.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

struct TestContext {
    dir: TempDir,
    config_path: PathBuf,
}

impl TestContext {
    fn new(fail_on: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config_path = dir.path().join("config.toml");
        let settings = format!(
            "[store]\ndata_dir = {:?}\n\n[driver]\npath = {:?}\n\n[driver.env]\nMOCK_DRIVER_FAIL_ON = {:?}\n\n[report]\ndir = {:?}\n",
            dir.path().join("data").display().to_string(),
            env!("CARGO_BIN_EXE_mock_driver"),
            fail_on,
            dir.path().join("reports").display().to_string(),
        );
        std::fs::write(&config_path, settings).expect("Failed to write settings");
        Self { dir, config_path }
    }

    fn webcase(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_webcase"))
            .args(args)
            .env("WEBCASE_CONFIG", &self.config_path)
            .env("RUST_LOG", "warn")
            .env_remove("MIDSCENE_MODEL_API_KEY")
            .env_remove("MIDSCENE_MODEL_BASE_URL")
            .env_remove("MIDSCENE_MODEL_NAME")
            .output()
            .expect("Failed to run webcase")
    }

    fn reports_dir(&self) -> PathBuf {
        self.dir.path().join("reports")
    }

    fn create_case(&self) -> String {
        let out = self.webcase(&[
            "case",
            "create",
            "--name",
            "Empty cart",
            "--base-url",
            "https://shop.test",
        ]);
        assert!(out.status.success(), "{}", stderr(&out));
        stdout(&out)
            .trim()
            .strip_prefix("Created test case ")
            .expect("unexpected create output")
            .to_string()
    }

    fn set_model(&self) {
        let out = self.webcase(&[
            "config",
            "set",
            "--api-key",
            "sk-test",
            "--base-url",
            "https://models.test/v1",
            "--model-name",
            "gpt-4o",
        ]);
        assert!(out.status.success(), "{}", stderr(&out));
    }
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn run_json(ctx: &TestContext, id: &str) -> (bool, serde_json::Value) {
    let out = ctx.webcase(&["run", id, "--json"]);
    let result = serde_json::from_slice(&out.stdout).expect("run --json printed invalid JSON");
    (out.status.success(), result)
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn test_run_without_model_configuration() {
    let ctx = TestContext::new("");
    let id = ctx.create_case();

    let (ok, result) = run_json(&ctx, &id);

    assert!(!ok);
    assert_eq!(result["status"], "failed");
    assert!(result["error"].as_str().unwrap().contains("configuration"));
    assert_eq!(result["executedSteps"].as_array().unwrap().len(), 0);
}

#[test]
fn test_build_and_run_case() {
    let ctx = TestContext::new("");
    let id = ctx.create_case();
    ctx.set_model();

    for args in [
        vec!["case", "add-step", id.as_str(), "tap", "--target", "Cart icon"],
        vec!["case", "add-step", id.as_str(), "assert", "--value", "Cart is empty"],
    ] {
        let out = ctx.webcase(&args);
        assert!(out.status.success(), "{}", stderr(&out));
    }

    let (ok, result) = run_json(&ctx, &id);

    assert!(ok, "{}", result);
    assert_eq!(result["status"], "passed");
    assert_eq!(result["testCaseId"], id.as_str());
    let steps = result["executedSteps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["stepType"], "tap");
    assert_eq!(steps[1]["stepType"], "assert");
    assert!(result["reportPath"].as_str().unwrap().ends_with(".html"));
    assert_eq!(count_files(&ctx.reports_dir()), 1);
}

#[test]
fn test_failed_run_exits_nonzero() {
    let ctx = TestContext::new("aiAssert");
    let id = ctx.create_case();
    ctx.set_model();
    ctx.webcase(&["case", "add-step", id.as_str(), "tap", "--target", "Cart icon"]);
    ctx.webcase(&["case", "add-step", id.as_str(), "assert", "--target", "Cart is empty"]);

    let (ok, result) = run_json(&ctx, &id);

    assert!(!ok);
    assert_eq!(
        result["error"],
        "Step failed [assert]: aiAssert failed in mock driver"
    );
    assert_eq!(result["executedSteps"][0]["status"], "passed");
    assert_eq!(result["executedSteps"][1]["status"], "failed");
}

#[test]
fn test_add_step_rejects_missing_params() {
    let ctx = TestContext::new("");
    let id = ctx.create_case();

    let out = ctx.webcase(&["case", "add-step", id.as_str(), "input", "--target", "Email"]);

    assert!(!out.status.success());
    assert!(stderr(&out).contains("value is required"));
}

#[test]
fn test_case_lifecycle() {
    let ctx = TestContext::new("");
    let id = ctx.create_case();

    let out = ctx.webcase(&["case", "update", id.as_str(), "--name", "Full cart"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = ctx.webcase(&["case", "show", id.as_str(), "--json"]);
    let case: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(case["name"], "Full cart");
    assert_eq!(case["baseUrl"], "https://shop.test");

    let out = ctx.webcase(&["case", "delete", id.as_str()]);
    assert!(out.status.success());

    let out = ctx.webcase(&["case", "show", id.as_str()]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Test case not found"));
}
