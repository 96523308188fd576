//! Tool-Calling Orchestrator
//!
//! Drives one bounded exchange with the model per user message:
//!
//! 1. Seed the conversation with the tool policy and the user's text
//! 2. Send the conversation and the tool schemas to the model
//! 3. No tool calls in the reply: return it as the final answer
//! 4. Otherwise resolve every call concurrently, append the results in
//!    request order, steer if skill content was fetched, and go to 2
//!
//! # Limits
//!
//! - `max_rounds` model replies per run (default 6)
//! - each model call is bounded by `model_timeout` and retried once
//!
//! A run never fails outright. Provider failure and round exhaustion both
//! come back as an `OrchestrationResult` with the matching `RunOutcome`.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use sdk::errors::EngineError;
use sdk::types::{OrchestrationResult, RunOutcome};

use super::conversation::Conversation;
use super::prompts;
use crate::config::Config;
use crate::llm::{LLMProvider, Message, ToolSchema};
use crate::tools::{dispatch_all, ToolDispatcher};

/// Maximum number of model replies per run
pub const DEFAULT_MAX_ROUNDS: usize = 6;

/// Wall-clock bound for one model call
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

/// Answer returned when the round budget runs out
pub const EXHAUSTED_ANSWER: &str = "Tool call rounds exhausted without a final answer.";

/// Attempts per model call inside the tool loop
const MODEL_ATTEMPTS: usize = 2;

pub struct Orchestrator {
    provider: Arc<dyn LLMProvider>,
    tools: Arc<ToolDispatcher>,
    max_rounds: usize,
    model_timeout: Duration,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LLMProvider>, tools: Arc<ToolDispatcher>) -> Self {
        Self {
            provider,
            tools,
            max_rounds: DEFAULT_MAX_ROUNDS,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    pub fn from_config(
        config: &Config,
        provider: Arc<dyn LLMProvider>,
        tools: Arc<ToolDispatcher>,
    ) -> Self {
        Self::new(provider, tools)
            .with_max_rounds(config.agent.max_rounds)
            .with_model_timeout(config.llm.request_timeout())
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_model_timeout(mut self, model_timeout: Duration) -> Self {
        self.model_timeout = model_timeout;
        self
    }

    pub fn model_id(&self) -> &str {
        self.provider.model()
    }

    /// Run one orchestration for `user_message`
    pub async fn run(&self, user_message: &str) -> OrchestrationResult {
        let run_id = Uuid::new_v4();
        let span = info_span!("orchestration", run_id = %run_id);
        self.run_rounds(user_message).instrument(span).await
    }

    async fn run_rounds(&self, user_message: &str) -> OrchestrationResult {
        info!(
            "Starting run with {} ({} rounds max)",
            self.provider.model(),
            self.max_rounds
        );

        let schemas = ToolDispatcher::schemas();
        let mut conversation = Conversation::seeded(prompts::system_policy(), user_message);
        let mut skill_used: Option<String> = None;
        let mut rounds = 0;

        while rounds < self.max_rounds {
            debug!("Round {}/{}", rounds + 1, self.max_rounds);

            let reply = match self.call_with_retry(conversation.messages(), &schemas).await {
                Ok(reply) => reply,
                Err(e) => {
                    error!("Model call failed after retry: {}", e);
                    return self.finish(
                        format!("Model call failed: {}", e),
                        skill_used,
                        rounds,
                        RunOutcome::ProviderFailed,
                    );
                }
            };
            rounds += 1;

            if !reply.has_tool_calls() {
                let answer = reply.text().to_string();
                conversation.push(reply);
                info!("Run finished after {} rounds", rounds);
                return self.finish(answer, skill_used, rounds, RunOutcome::Finished);
            }

            let calls = reply.tool_calls.clone();
            conversation.push(reply);
            debug!("Resolving {} tool calls", calls.len());

            let mut fetched = None;
            for outcome in dispatch_all(&self.tools, &calls).await {
                if outcome.loaded_skill.is_some() {
                    fetched = outcome.loaded_skill;
                }
                if let Some(execution) = &outcome.execution {
                    if execution.succeeded {
                        info!("Code executed, files: {:?}", execution.created_files);
                    } else {
                        warn!("Code execution failed: {}", execution.stderr);
                    }
                }
                conversation.push(Message::tool_result(outcome.content, outcome.call_id));
            }

            if let Some(name) = fetched {
                let custom = self
                    .tools
                    .registry()
                    .get(&name)
                    .and_then(|skill| skill.steering);
                conversation.push(Message::system(prompts::skill_steering(custom.as_deref())));
                info!("Loaded skill '{}'", name);
                skill_used = Some(name);
            }
        }

        warn!("{}", EngineError::RoundsExhausted(rounds));
        self.finish(
            EXHAUSTED_ANSWER.to_string(),
            skill_used,
            rounds,
            RunOutcome::Exhausted,
        )
    }

    /// Single-shot model call without tools; failures become an inline message
    pub async fn chat_once(&self, user_message: &str) -> String {
        let messages = [Message::user(user_message)];
        match self.call_model(&messages, &[]).await {
            Ok(reply) => reply.text().to_string(),
            Err(e) => {
                warn!("Chat call failed: {}", e);
                format!("Model call failed: {}", e)
            }
        }
    }

    async fn call_with_retry(
        &self,
        messages: &[Message],
        schemas: &[ToolSchema],
    ) -> Result<Message, EngineError> {
        let mut attempt = 1;
        loop {
            match self.call_model(messages, schemas).await {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt < MODEL_ATTEMPTS => {
                    warn!("Model call attempt {} failed, retrying: {}", attempt, e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_model(
        &self,
        messages: &[Message],
        schemas: &[ToolSchema],
    ) -> Result<Message, EngineError> {
        match timeout(self.model_timeout, self.provider.generate(messages, schemas)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(EngineError::LLMProvider(e.to_string())),
            Err(_) => Err(EngineError::LLMTimeout),
        }
    }

    fn finish(
        &self,
        answer: String,
        skill_used: Option<String>,
        rounds: usize,
        outcome: RunOutcome,
    ) -> OrchestrationResult {
        OrchestrationResult {
            answer,
            skills_used: skill_used.into_iter().collect(),
            model_id: self.provider.model().to_string(),
            rounds,
            outcome,
        }
    }
}
