//! Code Execution Sandbox
//!
//! Runs model-generated code in a fresh interpreter process rooted at the
//! workspace directory. Each submission is written to its own temporary
//! script, which is removed on every exit path, and also to a fixed debug
//! file in the workspace so operators can inspect the last attempt.
//!
//! Output documents are detected by scanning the workspace for known
//! extensions after the process exits. This is a best-effort signal: files
//! that already existed are reported too, and files written elsewhere are
//! missed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use sdk::errors::EngineError;
use sdk::types::ExecutionResult;

use crate::config::SandboxConfig;

/// Default wall-clock budget for one execution
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default name of the last-submission debug copy
pub const DEFAULT_DEBUG_FILE: &str = "last_generated_code.py";

/// Extensions reported as created output documents by default
pub const DEFAULT_OUTPUT_EXTENSIONS: [&str; 4] = ["pptx", "pdf", "docx", "html"];

const SCRIPT_PREFIX: &str = "skillforge-";
const SCRIPT_SUFFIX: &str = ".py";

#[derive(Debug, Clone)]
pub struct CodeSandbox {
    work_dir: PathBuf,
    interpreter: String,
    debug_file: Option<String>,
    output_extensions: Vec<String>,
}

impl CodeSandbox {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            interpreter: "python3".to_string(),
            debug_file: Some(DEFAULT_DEBUG_FILE.to_string()),
            output_extensions: DEFAULT_OUTPUT_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    pub fn from_config(config: &SandboxConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self::new(work_dir)
            .with_interpreter(config.interpreter.clone())
            .with_debug_file(Some(config.debug_file.clone()))
            .with_output_extensions(config.output_extensions.iter().cloned())
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// Set the debug copy's file name; `None` or an empty name disables it
    pub fn with_debug_file(mut self, debug_file: Option<String>) -> Self {
        self.debug_file = debug_file.filter(|name| !name.trim().is_empty());
        self
    }

    pub fn with_output_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Run `code` and report its outcome.
    ///
    /// Never fails: timeouts and launch failures come back as unsuccessful
    /// results whose `stderr` carries the error message.
    pub async fn execute(&self, code: &str, limit: Duration) -> ExecutionResult {
        info!(
            "Executing {} bytes of generated code with {}",
            code.len(),
            self.interpreter
        );

        self.write_debug_copy(code).await;

        let script = match self.write_script(code).await {
            Ok(script) => script,
            Err(e) => {
                warn!("{}", e);
                return ExecutionResult::failure(e.to_string());
            }
        };

        let result = self.run_script(script.path(), limit).await;

        if let Err(e) = script.close() {
            warn!("Failed to remove temporary script: {}", e);
        }

        match result {
            Ok(result) => result,
            Err(e) => {
                warn!("Code execution failed: {}", e);
                ExecutionResult::failure(e.to_string())
            }
        }
    }

    async fn write_debug_copy(&self, code: &str) {
        let Some(ref name) = self.debug_file else {
            return;
        };
        let path = self.work_dir.join(name);
        match tokio::fs::write(&path, code).await {
            Ok(()) => debug!("Saved generated code to {}", path.display()),
            Err(e) => warn!("Failed to save debug copy {}: {}", path.display(), e),
        }
    }

    async fn write_script(&self, code: &str) -> Result<NamedTempFile, EngineError> {
        let script = tempfile::Builder::new()
            .prefix(SCRIPT_PREFIX)
            .suffix(SCRIPT_SUFFIX)
            .tempfile()
            .map_err(|e| EngineError::ExecutionLaunch(format!("cannot create script: {}", e)))?;

        tokio::fs::write(script.path(), code)
            .await
            .map_err(|e| EngineError::ExecutionLaunch(format!("cannot write script: {}", e)))?;

        Ok(script)
    }

    async fn run_script(
        &self,
        script: &Path,
        limit: Duration,
    ) -> Result<ExecutionResult, EngineError> {
        // Dropping the wait future on timeout drops the child, which kills it.
        let child = Command::new(&self.interpreter)
            .arg(script)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::ExecutionLaunch(e.to_string()))?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(EngineError::ExecutionLaunch(e.to_string())),
            Err(_) => return Err(EngineError::ExecutionTimeout(limit)),
        };

        let succeeded = output.status.success();
        if succeeded {
            debug!("Generated code exited cleanly");
        } else {
            warn!("Generated code exited with {}", output.status);
        }

        Ok(ExecutionResult {
            succeeded,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            created_files: self.scan_artifacts().await,
        })
    }

    /// Files directly inside the workspace whose extension is an output type
    pub async fn scan_artifacts(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();

        let mut entries = match tokio::fs::read_dir(&self.work_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Cannot scan workspace {} for outputs: {}",
                    self.work_dir.display(),
                    e
                );
                return found;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Workspace scan interrupted: {}", e);
                    break;
                }
            };

            let is_file = entry
                .file_type()
                .await
                .map(|file_type| file_type.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }

            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    self.output_extensions.iter().any(|known| *known == ext)
                })
                .unwrap_or(false);

            if matches {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    found.insert(name.to_string());
                }
            }
        }

        found
    }
}
