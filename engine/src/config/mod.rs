//! Configuration management
//!
//! This module handles loading, validation, and management of the Skillforge
//! configuration. Configuration is stored in TOML format at
//! ~/.skillforge/config.toml and created with defaults on first use.
//!
//! # Configuration Sections
//!
//! - **core**: Workspace path (sandbox working directory), log level
//! - **llm**: OpenAI-compatible endpoint, model and sampling settings
//! - **skills**: Skill document store location
//! - **sandbox**: Interpreter, execution timeout, output detection
//! - **agent**: Orchestration limits
//!
//! # Path Expansion
//!
//! The configuration system automatically:
//! - Expands ~ to the user's home directory
//! - Canonicalizes the workspace, creating it if it doesn't exist
//! - Creates the skills directory if it doesn't exist
//!
//! # Examples
//!
//! ```no_run
//! use skillforge_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Workspace: {:?}", config.core.workspace);
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    pub core: CoreConfig,

    /// Model provider configuration
    pub llm: LLMConfig,

    /// Skill store configuration
    #[serde(default)]
    pub skills: SkillsConfig,

    /// Code execution sandbox configuration
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Orchestration limits
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Working directory for generated code and its output documents
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Wall-clock bound for one model call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Skill store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsConfig {
    /// Directory scanned for `SKILL.md` documents
    #[serde(default = "default_skills_dir")]
    pub dir: PathBuf,
}

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_sandbox_timeout_secs")]
    pub timeout_secs: u64,

    /// File in the workspace receiving a copy of the last submission ("" disables)
    #[serde(default = "default_debug_file")]
    pub debug_file: String,

    /// Extensions reported as created output documents
    #[serde(default = "default_output_extensions")]
    pub output_extensions: Vec<String>,
}

/// Orchestration limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

fn default_workspace() -> PathBuf {
    PathBuf::from("~/.skillforge/workspace")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://open.bigmodel.cn/api/paas/v4".to_string()
}

fn default_model() -> String {
    "glm-4.6".to_string()
}

fn default_api_key_env() -> String {
    "ZHIPUAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    7000
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_skills_dir() -> PathBuf {
    PathBuf::from("~/.skillforge/skills")
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_sandbox_timeout_secs() -> u64 {
    crate::sandbox::DEFAULT_TIMEOUT.as_secs()
}

fn default_debug_file() -> String {
    crate::sandbox::DEFAULT_DEBUG_FILE.to_string()
}

fn default_output_extensions() -> Vec<String> {
    crate::sandbox::DEFAULT_OUTPUT_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_max_rounds() -> usize {
    crate::agent::DEFAULT_MAX_ROUNDS
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            log_level: default_log_level(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            dir: default_skills_dir(),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_secs: default_sandbox_timeout_secs(),
            debug_file: default_debug_file(),
            output_extensions: default_output_extensions(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

impl LLMConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SandboxConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the file cannot be read, parsed or
    /// validated, or if the default file cannot be written.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse, validate and process configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        // Written before processing so the file keeps the portable ~ paths
        let default = Self::default_config();
        let toml_string = toml::to_string_pretty(&default)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = default;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Path of the default configuration file (~/.skillforge/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".skillforge").join("config.toml"))
    }

    /// Default configuration, before path processing
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LLMConfig::default(),
            skills: SkillsConfig::default(),
            sandbox: SandboxConfig::default(),
            agent: AgentConfig::default(),
        }
    }

    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.llm.base_url.trim().is_empty() {
            return Err(EngineError::Config("llm.base_url must not be empty".to_string()));
        }
        self.llm.base_url = self.llm.base_url.trim_end_matches('/').to_string();

        if self.llm.model.trim().is_empty() {
            return Err(EngineError::Config("llm.model must not be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(EngineError::Config(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.sandbox.interpreter.trim().is_empty() {
            return Err(EngineError::Config(
                "sandbox.interpreter must not be empty".to_string(),
            ));
        }

        if self.sandbox.timeout_secs == 0 {
            return Err(EngineError::Config(
                "sandbox.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.sandbox.output_extensions.is_empty() {
            return Err(EngineError::Config(
                "sandbox.output_extensions must list at least one extension".to_string(),
            ));
        }

        if self.agent.max_rounds == 0 {
            return Err(EngineError::Config(
                "agent.max_rounds must be at least 1".to_string(),
            ));
        }

        // Expand and validate workspace path
        self.core.workspace = expand_path(&self.core.workspace)?;
        self.core.workspace = canonicalize_or_create(&self.core.workspace)?;

        if !self.core.workspace.is_dir() {
            return Err(EngineError::Config(format!(
                "Workspace path is not a directory: {:?}",
                self.core.workspace
            )));
        }

        // Skills directory: relative paths live under the workspace
        let skills_dir = expand_path(&self.skills.dir)?;
        self.skills.dir = if skills_dir.is_relative() {
            self.core.workspace.join(skills_dir)
        } else {
            skills_dir
        };

        if !self.skills.dir.exists() {
            fs::create_dir_all(&self.skills.dir).map_err(|e| {
                EngineError::Config(format!("Failed to create skills directory: {}", e))
            })?;
        }

        Ok(())
    }
}

/// Expand ~ to the user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Canonicalize a path, creating the directory first if it doesn't exist
fn canonicalize_or_create(path: &Path) -> Result<PathBuf, EngineError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            EngineError::Config(format!("Failed to create directory {:?}: {}", path, e))
        })?;
    }

    path.canonicalize().map_err(|e| {
        EngineError::Config(format!("Failed to canonicalize path {:?}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &Path, extra: &str) -> String {
        format!(
            "[core]\nworkspace = {:?}\nlog_level = \"debug\"\n\n[llm]\n{}",
            dir.to_str().unwrap(),
            extra
        )
    }

    #[test]
    fn test_default_config_creation() {
        let config = Config::default_config();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.model, "glm-4.6");
        assert_eq!(config.llm.api_key_env, "ZHIPUAI_API_KEY");
        assert_eq!(config.llm.max_tokens, 7000);
        assert_eq!(config.sandbox.timeout_secs, 30);
        assert_eq!(config.sandbox.interpreter, "python3");
        assert_eq!(config.agent.max_rounds, 6);
        assert_eq!(
            config.sandbox.output_extensions,
            vec!["pptx", "pdf", "docx", "html"]
        );
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_config();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.llm.base_url, deserialized.llm.base_url);
        assert_eq!(config.agent.max_rounds, deserialized.agent.max_rounds);
    }

    #[test]
    fn test_minimal_config_fills_defaults_and_dirs() {
        let dir = tempdir().unwrap();
        let workspace = dir.path().join("ws");
        let config = Config::from_toml_str(&config_in(&workspace, "")).unwrap();

        assert!(config.core.workspace.is_dir());
        assert_eq!(config.core.log_level, "debug");
        assert_eq!(config.llm.model, "glm-4.6");
        assert!(config.skills.dir.is_dir());
        assert_eq!(config.sandbox.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_relative_skills_dir_under_workspace() {
        let dir = tempdir().unwrap();
        let text = format!(
            "{}\n[skills]\ndir = \"skills_storage\"\n",
            config_in(dir.path(), "")
        );
        let config = Config::from_toml_str(&text).unwrap();

        assert_eq!(config.skills.dir, config.core.workspace.join("skills_storage"));
        assert!(config.skills.dir.is_dir());
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base_url() {
        let dir = tempdir().unwrap();
        let config = Config::from_toml_str(&config_in(
            dir.path(),
            "base_url = \"http://localhost:8080/v1/\"\n",
        ))
        .unwrap();
        assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        for extra in [
            "temperature = 3.5\n",
            "max_tokens = 0\n",
            "request_timeout_secs = 0\n",
            "model = \"\"\n",
        ] {
            let err = Config::from_toml_str(&config_in(dir.path(), extra)).unwrap_err();
            assert!(matches!(err, EngineError::Config(_)), "accepted {}", extra);
        }

        let text = format!("{}\n[agent]\nmax_rounds = 0\n", config_in(dir.path(), ""));
        assert!(Config::from_toml_str(&text).is_err());

        let text = config_in(dir.path(), "").replace("debug", "verbose");
        assert!(Config::from_toml_str(&text).is_err());
    }
}
