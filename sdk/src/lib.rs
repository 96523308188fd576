//! Skillforge SDK
//!
//! Shared data model and error types for Skillforge components.

/// Error types and handling
pub mod errors;

/// Skill, execution and orchestration records
pub mod types;

pub use errors::{EngineError, ForgeErrorExt};
pub use types::{CatalogEntry, ExecutionResult, OrchestrationResult, RunOutcome, SkillMetadata};
