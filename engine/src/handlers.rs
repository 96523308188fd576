//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: Full tool-calling orchestration
//! - chat: Single model call without tools
//! - exec: Run a code file in the sandbox
//! - skill: List, inspect, install and remove skills
//! - doctor: Validate configuration and check dependencies

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sdk::types::RunOutcome;

use crate::agent::Orchestrator;
use crate::config::Config;
use crate::llm::openai::OpenAIProvider;
use crate::llm::LLMProvider;
use crate::sandbox::CodeSandbox;
use crate::skills::{SkillRegistry, SkillStore};
use crate::tools::ToolDispatcher;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

async fn open_registry(config: &Config) -> Result<SkillRegistry> {
    let store = SkillStore::open(&config.skills.dir)
        .await
        .context("Failed to open skills directory")?;
    SkillRegistry::load(store)
        .await
        .context("Failed to load skills")
}

fn sandbox(config: &Config) -> CodeSandbox {
    CodeSandbox::from_config(&config.sandbox, &config.core.workspace)
}

async fn orchestrator(config: &Config) -> Result<Orchestrator> {
    let provider = OpenAIProvider::from_env(config.llm.clone())
        .context("Model provider is not configured")?;
    let registry = open_registry(config).await?;
    let tools = ToolDispatcher::new(registry, sandbox(config))
        .with_execution_timeout(config.sandbox.timeout());

    Ok(Orchestrator::from_config(
        config,
        Arc::new(provider),
        Arc::new(tools),
    ))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a full orchestration for one message
pub async fn handle_run(message: String, config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = orchestrator(config).await?;
    let result = orchestrator.run(&message).await;

    match format {
        OutputFormat::Text => {
            println!("{}", result.answer);
            println!();
            let skills = if result.skills_used.is_empty() {
                "none".to_string()
            } else {
                result.skills_used.join(", ")
            };
            println!("  Skills used: {}", skills);
            println!("  Model:       {}", result.model_id);
            println!("  Rounds:      {}", result.rounds);
        }
        OutputFormat::Json => print_json(&result)?,
    }

    if result.outcome == RunOutcome::ProviderFailed {
        bail!("{}", result.answer);
    }
    Ok(())
}

/// Ask the model once without tools
pub async fn handle_chat(message: String, config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = orchestrator(config).await?;
    let answer = orchestrator.chat_once(&message).await;

    match format {
        OutputFormat::Text => println!("{}", answer),
        OutputFormat::Json => print_json(&json!({
            "answer": answer,
            "model": orchestrator.model_id(),
        }))?,
    }
    Ok(())
}

/// Execute a code file in the sandbox
pub async fn handle_exec(
    file: &Path,
    timeout_secs: Option<u64>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let code = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let limit = timeout_secs
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.sandbox.timeout());

    let result = sandbox(config).execute(&code, limit).await;

    match format {
        OutputFormat::Text => {
            if !result.stdout.is_empty() {
                print!("{}", result.stdout);
            }
            if !result.stderr.is_empty() {
                eprint!("{}", result.stderr);
            }
            println!();
            if result.succeeded {
                println!("✓ Execution succeeded");
            } else {
                println!("✗ Execution failed");
            }
            for name in &result.created_files {
                println!("  {}", name);
            }
        }
        OutputFormat::Json => print_json(&result)?,
    }
    Ok(())
}

/// List installed skills with their source
pub async fn handle_skill_list(config: &Config, format: OutputFormat) -> Result<()> {
    let registry = open_registry(config).await?;
    let skills = registry.get_all();

    match format {
        OutputFormat::Text => {
            if skills.is_empty() {
                println!("No skills found in {}", config.skills.dir.display());
                println!("Install one with 'skillforge skill add <FILE>'.");
                return Ok(());
            }

            println!("Skills ({}):", config.skills.dir.display());
            println!();
            for skill in &skills {
                if skill.tags.is_empty() {
                    println!("  {}", skill.name);
                } else {
                    println!("  {} [{}]", skill.name, skill.tags.join(", "));
                }
                if !skill.description.is_empty() {
                    println!("    {}", skill.description);
                }
                println!("    {}", skill.source_location);
            }
            println!();
            println!("{} skill(s) loaded.", skills.len());
        }
        OutputFormat::Json => {
            let entries: Vec<_> = skills
                .iter()
                .map(|skill| {
                    json!({
                        "name": skill.name,
                        "description": skill.description,
                        "tags": skill.tags,
                        "source": skill.source_location,
                    })
                })
                .collect();
            print_json(&entries)?;
        }
    }
    Ok(())
}

/// Print the catalog as the model receives it
pub async fn handle_skill_catalog(config: &Config) -> Result<()> {
    let registry = open_registry(config).await?;
    print_json(&json!({ "skills": registry.catalog() }))
}

/// Print one skill's full content
pub async fn handle_skill_show(name: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let registry = open_registry(config).await?;
    let Some(skill) = registry.get(name) else {
        bail!("Skill '{}' not found", name);
    };

    match format {
        OutputFormat::Text => {
            println!("# {}", skill.name);
            if !skill.description.is_empty() {
                println!("{}", skill.description);
            }
            println!();
            println!("{}", skill.content);
        }
        OutputFormat::Json => print_json(&skill)?,
    }
    Ok(())
}

/// Install a skill document
pub async fn handle_skill_add(
    file: &Path,
    name: Option<String>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let is_markdown = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("md"))
        .unwrap_or(false);
    if !is_markdown {
        bail!("Only .md skill documents can be installed: {}", file.display());
    }

    let requested = match name {
        Some(name) => name,
        None => file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .context("Cannot derive a skill name from the file name")?,
    };

    let document = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let registry = open_registry(config).await?;
    let skill = registry.install(&requested, &document).await?;

    match format {
        OutputFormat::Text => {
            println!("✓ Installed skill '{}'", skill.name);
            println!("  {}", skill.source_location);
        }
        OutputFormat::Json => print_json(&json!({
            "installed": skill.name,
            "source": skill.source_location,
        }))?,
    }
    Ok(())
}

/// Remove an installed skill
pub async fn handle_skill_remove(name: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let registry = open_registry(config).await?;
    registry.uninstall(name).await?;

    match format {
        OutputFormat::Text => println!("✓ Removed skill '{}'", name),
        OutputFormat::Json => print_json(&json!({ "removed": name }))?,
    }
    Ok(())
}

/// Validate configuration and check dependencies
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(&str, String)> = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration", "Valid".to_string()));

    if config.core.workspace.is_dir() {
        checks.push(("Workspace directory", "Exists".to_string()));
    } else {
        checks.push(("Workspace directory", "Missing".to_string()));
        issues.push(format!(
            "Workspace directory does not exist: {}",
            config.core.workspace.display()
        ));
    }

    match open_registry(config).await {
        Ok(registry) => checks.push(("Skills", format!("{} loaded", registry.len()))),
        Err(e) => {
            checks.push(("Skills", "Unreadable".to_string()));
            issues.push(format!("Cannot load skills: {:#}", e));
        }
    }

    let probe = tokio::process::Command::new(&config.sandbox.interpreter)
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .status();
    match tokio::time::timeout(Duration::from_secs(5), probe).await {
        Ok(Ok(status)) if status.success() => {
            checks.push(("Interpreter", format!("{} available", config.sandbox.interpreter)))
        }
        _ => {
            checks.push(("Interpreter", "Not available".to_string()));
            issues.push(format!(
                "Interpreter '{}' could not be started",
                config.sandbox.interpreter
            ));
        }
    }

    match OpenAIProvider::from_env(config.llm.clone()) {
        Ok(provider) => {
            checks.push(("API key", format!("{} set", config.llm.api_key_env)));
            if provider.check_health().await {
                checks.push(("Model endpoint", "Reachable".to_string()));
            } else {
                checks.push(("Model endpoint", "Unreachable".to_string()));
                issues.push(format!(
                    "Cannot list models at {}; check the base URL and key",
                    config.llm.base_url
                ));
            }
        }
        Err(_) => {
            checks.push(("API key", "Not configured".to_string()));
            issues.push(format!(
                "Set {} in the environment or a .env file",
                config.llm.api_key_env
            ));
        }
    }

    checks.push(("Model", format!("{} @ {}", config.llm.model, config.llm.base_url)));

    match format {
        OutputFormat::Text => {
            println!("Skillforge Diagnostics");
            println!("======================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<22} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            print_json(&output)?;
        }
    }

    Ok(())
}
