//! Shared data model
//!
//! Records exchanged between the skill registry, the sandbox and the
//! orchestrator, and handed back to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A skill as known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    /// Unique registry key
    pub name: String,

    pub description: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Full instructional body, never part of the catalog view
    pub content: String,

    /// Where the document was loaded from
    pub source_location: String,

    /// Skill-specific guidance injected after the content has been fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steering: Option<String>,
}

impl SkillMetadata {
    /// Create metadata without tags, source or steering
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            content: content.into(),
            source_location: String::new(),
            steering: None,
        }
    }

    /// Add tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set skill-specific steering text
    pub fn with_steering(mut self, steering: impl Into<String>) -> Self {
        self.steering = Some(steering.into());
        self
    }

    /// Lightweight view used when the model is choosing among skills
    pub fn catalog_entry(&self) -> CatalogEntry {
        CatalogEntry {
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Catalog view of a skill: name, description and tags only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Outcome of one sandbox invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// True iff the process exited with status zero
    pub succeeded: bool,

    pub stdout: String,

    /// Captured stderr, or the timeout/launch error message
    pub stderr: String,

    /// Output documents found in the working directory (best effort)
    pub created_files: BTreeSet<String>,
}

impl ExecutionResult {
    /// A failed result carrying only an error message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: message.into(),
            created_files: BTreeSet::new(),
        }
    }
}

/// How an orchestration run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The model replied without tool calls
    Finished,

    /// The round budget ran out
    Exhausted,

    /// The model provider failed after its retry
    ProviderFailed,
}

/// Terminal output of one orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub answer: String,

    /// At most one entry: the last skill whose content was fetched
    pub skills_used: Vec<String>,

    #[serde(rename = "model")]
    pub model_id: String,

    /// Model replies received during the run
    pub rounds: usize,

    pub outcome: RunOutcome,
}
