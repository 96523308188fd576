//! Skillforge Engine Library
//!
//! Skill registry, code sandbox, tool dispatch and the tool-calling
//! orchestrator. It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Skill documents, store and registry
pub mod skills;

/// Code execution sandbox
pub mod sandbox;

/// LLM provider abstraction layer
pub mod llm;

/// Tool schemas and dispatch
pub mod tools;

/// Tool-calling orchestration
pub mod agent;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
