//! CLI command handling
//!
//! Dispatches CLI commands to the store and the executor and formats output.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use colored::Colorize;

use crate::commands::{CaseCommands, Commands, ConfigCommands};
use crate::common::config::Config;
use crate::common::{logging, Error, Result};
use crate::engine::Executor;
use crate::model::{
    ExecutionResult, NewModelConfiguration, NewTestCase, RunStatus, Step, StepKind, StepParams,
    TestCase, TestCaseUpdate,
};
use crate::resolver;
use crate::store::{CaseStore, FsStore};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<ExitCode> {
    let store = FsStore::from_config(config);

    match command {
        Commands::Run {
            id,
            json,
            timeout,
            headless,
            no_report,
        } => {
            let mut config = config.clone();
            if headless {
                config.browser.headless = true;
            }
            if no_report {
                config.report.enabled = false;
            }

            if !json {
                println!("\n{} {}", "Running test case:".blue().bold(), id.white().bold());
            }

            let executor = Executor::from_config(&config);
            let result = match timeout {
                Some(secs) => {
                    executor
                        .run_with_deadline(&id, Duration::from_secs(secs))
                        .await
                }
                None => executor.run(&id).await,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }

            Ok(if result.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Case(case_cmd) => {
            dispatch_case(case_cmd, &store).await?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Config(config_cmd) => {
            dispatch_config(config_cmd, &store).await?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Logs { lines, clear } => {
            let Some(path) = logging::log_path() else {
                return Err(Error::Config("no data directory for logs".to_string()));
            };
            if clear {
                if path.exists() {
                    std::fs::write(&path, "")?;
                }
                println!("Log file cleared");
                return Ok(ExitCode::SUCCESS);
            }
            print_log_tail(&path, lines)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn dispatch_case(command: CaseCommands, store: &FsStore) -> Result<()> {
    match command {
        CaseCommands::List { json } => {
            let cases = store.list_test_cases().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cases)?);
            } else if cases.is_empty() {
                println!("No test cases. Create one with 'webcase case create'.");
            } else {
                for case in &cases {
                    println!(
                        "{}  {} ({} steps) {}",
                        case.id.dimmed(),
                        case.name.white().bold(),
                        case.steps.len(),
                        case.base_url.dimmed()
                    );
                }
            }
            Ok(())
        }

        CaseCommands::Show { id, json } => {
            let case = store
                .get_test_case(&id)
                .await?
                .ok_or_else(|| Error::TestCaseNotFound(id.clone()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&case)?);
            } else {
                print_case(&case);
            }
            Ok(())
        }

        CaseCommands::Create {
            name,
            base_url,
            file,
        } => {
            let input = match file {
                Some(path) => read_case_file(&path)?,
                None => NewTestCase {
                    name: name.unwrap_or_default(),
                    base_url: base_url.unwrap_or_default(),
                    steps: Vec::new(),
                },
            };
            let case = store.create_test_case(input).await?;
            println!("Created test case {}", case.id);
            Ok(())
        }

        CaseCommands::Update { id, name, base_url } => {
            let case = store
                .update_test_case(
                    &id,
                    TestCaseUpdate {
                        name,
                        base_url,
                        steps: None,
                    },
                )
                .await?;
            println!("Updated test case {} ({})", case.id, case.name);
            Ok(())
        }

        CaseCommands::Delete { id } => {
            store.delete_test_case(&id).await?;
            println!("Test case {} deleted", id);
            Ok(())
        }

        CaseCommands::AddStep {
            id,
            kind,
            target,
            value,
            url,
            timeout_ms,
            position,
        } => {
            let kind = StepKind::parse(&kind);
            if let StepKind::Unknown(tag) = &kind {
                let known: Vec<String> = StepKind::KNOWN.iter().map(|k| k.to_string()).collect();
                return Err(Error::Validation(format!(
                    "unknown step kind '{}' (expected one of: {})",
                    tag,
                    known.join(", ")
                )));
            }

            let step = Step::new(
                kind,
                StepParams {
                    target,
                    value,
                    url,
                    timeout_ms,
                },
            );
            step.validate()?;

            let mut steps = load_case(store, &id).await?.steps;
            let index = position.unwrap_or(steps.len());
            if index > steps.len() {
                return Err(Error::Validation(format!(
                    "position {} is past the end ({} steps)",
                    index,
                    steps.len()
                )));
            }
            let step_id = step.id.clone();
            steps.insert(index, step);

            store
                .update_test_case(
                    &id,
                    TestCaseUpdate {
                        steps: Some(steps),
                        ..Default::default()
                    },
                )
                .await?;
            println!("Step {} added at position {}", step_id, index);
            Ok(())
        }

        CaseCommands::RemoveStep { id, step_id } => {
            let mut steps = load_case(store, &id).await?.steps;
            let before = steps.len();
            steps.retain(|s| s.id != step_id);
            if steps.len() == before {
                return Err(Error::Validation(format!(
                    "step '{}' not found in test case {}",
                    step_id, id
                )));
            }

            store
                .update_test_case(
                    &id,
                    TestCaseUpdate {
                        steps: Some(steps),
                        ..Default::default()
                    },
                )
                .await?;
            println!("Step {} removed", step_id);
            Ok(())
        }
    }
}

async fn dispatch_config(command: ConfigCommands, store: &FsStore) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let (config, source) = match store.get_model_config().await? {
                Some(config) => (config, "saved"),
                None => match resolver::from_env(|key| std::env::var(key).ok()) {
                    Some(config) => (config, "environment"),
                    None => return Err(Error::ModelConfigNotFound),
                },
            };

            println!("Model configuration ({}):", source);
            println!(
                "  API key:  {}",
                if config.api_key.is_empty() { "not set" } else { "set" }
            );
            println!("  Base URL: {}", config.base_url);
            println!("  Model:    {}", config.model_name);
            println!("  Family:   {}", config.family());
            if let Some(updated) = config.updated_at {
                println!("  Updated:  {}", updated.to_rfc3339());
            }
            Ok(())
        }

        ConfigCommands::Set {
            api_key,
            base_url,
            model_name,
            model_family,
        } => {
            let config = store
                .save_model_config(NewModelConfiguration {
                    api_key,
                    base_url,
                    model_name,
                    model_family,
                })
                .await?;
            println!(
                "Model configuration saved ({}, family {})",
                config.model_name,
                config.family()
            );
            Ok(())
        }
    }
}

async fn load_case(store: &FsStore, id: &str) -> Result<TestCase> {
    store
        .get_test_case(id)
        .await?
        .ok_or_else(|| Error::TestCaseNotFound(id.to_string()))
}

fn read_case_file(path: &Path) -> Result<NewTestCase> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn print_case(case: &TestCase) {
    println!("{} {}", case.name.white().bold(), case.id.dimmed());
    println!("  Base URL: {}", case.base_url);
    println!("  Created:  {}", case.created_at.to_rfc3339());
    println!("  Updated:  {}", case.updated_at.to_rfc3339());

    if case.steps.is_empty() {
        println!("  No steps");
        return;
    }

    println!("\n{}", "Steps:".cyan());
    for (i, step) in case.steps.iter().enumerate() {
        let p = &step.params;
        let detail = [
            p.target.as_ref().map(|t| format!("target: {}", t)),
            p.value.as_ref().map(|v| format!("value: {}", v)),
            p.url.as_ref().map(|u| format!("url: {}", u)),
            p.timeout_ms.map(|t| format!("timeout: {}ms", t)),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

        println!(
            "  {}. [{}] {} {}",
            i + 1,
            step.kind,
            detail,
            step.id.dimmed()
        );
    }
}

fn print_result(result: &ExecutionResult) {
    println!("\n{}", "Steps:".cyan());
    for (i, step) in result.executed_steps.iter().enumerate() {
        match step.status {
            RunStatus::Passed => println!(
                "  {} Step {} [{}] {}",
                "✓".green(),
                i + 1,
                step.step_type,
                format!("{}ms", step.duration_ms).dimmed()
            ),
            RunStatus::Failed => println!(
                "  {} Step {} [{}]: {}",
                "✗".red(),
                i + 1,
                step.step_type,
                step.error.as_deref().unwrap_or("failed")
            ),
        }
    }

    let seconds = result.duration_ms as f64 / 1000.0;
    if result.passed() {
        println!(
            "\n{} {} ({} steps, {:.2}s)",
            "✓".green().bold(),
            "Test Passed".green().bold(),
            result.executed_steps.len(),
            seconds
        );
    } else {
        println!(
            "\n{} {} ({:.2}s)",
            "✗".red().bold(),
            "Test Failed".red().bold(),
            seconds
        );
        if let Some(error) = &result.error {
            println!("  {}", error);
        }
        if let Some(step) = result.failed_step() {
            println!("  Failed step: {}", step.step_id.dimmed());
        }
    }

    if let Some(path) = &result.report_path {
        println!("  Report: {}", path.display().to_string().dimmed());
    }
    println!();
}

fn print_log_tail(path: &Path, lines: usize) -> Result<()> {
    if !path.exists() {
        println!("No log file at {}", path.display());
        return Ok(());
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    for line in &all[start..] {
        println!("{}", line);
    }
    Ok(())
}
