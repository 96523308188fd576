//! Orchestration
//!
//! The multi-round tool-calling loop, the conversation it maintains, and the
//! system guidance it injects.

pub mod conversation;
pub mod orchestrator;
pub mod prompts;

pub use conversation::Conversation;
pub use orchestrator::{
    Orchestrator, DEFAULT_MAX_ROUNDS, DEFAULT_MODEL_TIMEOUT, EXHAUSTED_ANSWER,
};
