//! Error types and handling
//!
//! This module provides the error types used throughout the Skillforge engine.
//! All errors implement the `ForgeErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Most of these errors never reach the caller of an orchestration run: skill
//! parse failures are logged and skipped, tool and sandbox failures are turned
//! into tool results for the model, and provider failures degrade the run's
//! answer. They surface directly only from administrative operations
//! (installing or removing skills, loading configuration).

use std::time::Duration;
use thiserror::Error;

/// Trait for Skillforge error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait ForgeErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require manual intervention.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Skills**: Malformed documents, unknown names, unusable names
/// - **Tools**: Unknown tools and malformed tool arguments
/// - **Sandbox**: Timeouts and launch failures
/// - **LLM Provider**: API failures, authentication errors, timeouts
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, ForgeErrorExt};
///
/// let error = EngineError::SkillNotFound("pptx".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("bad log level".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Skill errors
    #[error("Malformed skill document: {0}")]
    SkillParse(String),

    #[error("Skill not found: {0}")]
    SkillNotFound(String),

    #[error("Invalid skill name: {0:?}")]
    InvalidSkillName(String),

    // Tool errors
    #[error("Tool dispatch error: {0}")]
    ToolDispatch(String),

    // Sandbox errors
    #[error("Code execution timed out after {0:?}")]
    ExecutionTimeout(Duration),

    #[error("Failed to launch code execution: {0}")]
    ExecutionLaunch(String),

    // Orchestration errors
    #[error("Tool-calling rounds exhausted after {0} rounds")]
    RoundsExhausted(usize),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out")]
    LLMTimeout,

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ForgeErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::SkillParse(_) => {
                "Skill documents must start with a --- delimited YAML header containing a name"
            }
            Self::SkillNotFound(_) => "Run 'skillforge skill list' to see installed skills",
            Self::InvalidSkillName(_) => "Choose a skill name with at least one usable character",

            Self::ToolDispatch(_) => "The model issued a tool call that could not be handled",

            Self::ExecutionTimeout(_) => "Generated code ran too long. Simplify the request",
            Self::ExecutionLaunch(_) => "Check that the sandbox interpreter is installed",

            Self::RoundsExhausted(_) => "Task too complex. Try breaking it into smaller steps",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API key and network",
            Self::LLMTimeout => "LLM provider took too long to respond. Try again",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
