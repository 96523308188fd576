//! Tool dispatch
//!
//! The model can call exactly three tools: list the skill catalog, fetch one
//! skill's full content, and execute code in the sandbox. Arguments arrive as
//! opaque JSON and are decoded into a typed record per tool at this boundary.
//! Every call yields a JSON result string, including failures, so the model
//! can see the problem and self-correct.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use sdk::errors::EngineError;
use sdk::types::ExecutionResult;

use crate::llm::{ToolCall, ToolSchema};
use crate::sandbox::{CodeSandbox, DEFAULT_TIMEOUT};
use crate::skills::SkillRegistry;

pub const LIST_SKILLS_CATALOG: &str = "list_skills_catalog";
pub const GET_SKILL_CONTENT: &str = "get_skill_content";
pub const EXECUTE_PYTHON_CODE: &str = "execute_python_code";

#[derive(Debug, Deserialize)]
struct GetSkillContentArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteCodeArgs {
    code: String,
}

/// Resolution of one tool call
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// Id of the call this answers
    pub call_id: String,

    /// JSON result handed back to the model
    pub content: String,

    /// Skill whose non-empty content was fetched by this call
    pub loaded_skill: Option<String>,

    /// Sandbox result, for code execution calls
    pub execution: Option<ExecutionResult>,
}

impl ToolOutcome {
    fn new(call_id: &str, content: serde_json::Value) -> Self {
        Self {
            call_id: call_id.to_string(),
            content: content.to_string(),
            loaded_skill: None,
            execution: None,
        }
    }

    fn error(call_id: &str, error: &EngineError) -> Self {
        Self::new(call_id, json!({ "error": error.to_string() }))
    }
}

/// Routes tool calls to the skill registry or the sandbox
pub struct ToolDispatcher {
    registry: SkillRegistry,
    sandbox: CodeSandbox,
    execution_timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: SkillRegistry, sandbox: CodeSandbox) -> Self {
        Self {
            registry,
            sandbox,
            execution_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_execution_timeout(mut self, execution_timeout: Duration) -> Self {
        self.execution_timeout = execution_timeout;
        self
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    /// Function schemas for the three tools
    pub fn schemas() -> Vec<ToolSchema> {
        vec![
            ToolSchema {
                name: LIST_SKILLS_CATALOG.to_string(),
                description: "List the available skills with only their name, description and tags."
                    .to_string(),
                parameters: json!({ "type": "object", "properties": {}, "required": [] }),
            },
            ToolSchema {
                name: GET_SKILL_CONTENT.to_string(),
                description: "Fetch the full instructions of one skill by name.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Skill name from the catalog" }
                    },
                    "required": ["name"]
                }),
            },
            ToolSchema {
                name: EXECUTE_PYTHON_CODE.to_string(),
                description: "Execute complete Python code that generates files (PPT, PDF, documents). \
                              Returns the output, errors and the files created."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "code": { "type": "string", "description": "Complete Python code to run" }
                    },
                    "required": ["code"]
                }),
            },
        ]
    }

    /// Resolve one tool call. Never fails; errors become `{"error": ...}` results.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        debug!(
            "Dispatching tool '{}' ({}) with args: {}",
            call.name, call.id, call.arguments
        );

        match self.try_dispatch(call).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Tool call {} ({}) failed: {}", call.name, call.id, e);
                ToolOutcome::error(&call.id, &e)
            }
        }
    }

    async fn try_dispatch(&self, call: &ToolCall) -> Result<ToolOutcome, EngineError> {
        match call.name.as_str() {
            LIST_SKILLS_CATALOG => Ok(ToolOutcome::new(
                &call.id,
                json!({ "skills": self.registry.catalog() }),
            )),
            GET_SKILL_CONTENT => {
                let args: GetSkillContentArgs = decode_arguments(call)?;
                let content = self.registry.full_content(&args.name).unwrap_or_default();
                if content.is_empty() {
                    debug!("Skill '{}' not found or empty", args.name);
                }

                let mut outcome = ToolOutcome::new(
                    &call.id,
                    json!({ "name": args.name, "content": content }),
                );
                if !content.is_empty() {
                    outcome.loaded_skill = Some(args.name);
                }
                Ok(outcome)
            }
            EXECUTE_PYTHON_CODE => {
                let args: ExecuteCodeArgs = decode_arguments(call)?;
                let result = self
                    .sandbox
                    .execute(&args.code, self.execution_timeout)
                    .await;

                let error = if result.succeeded {
                    ""
                } else {
                    result.stderr.as_str()
                };
                let mut outcome = ToolOutcome::new(
                    &call.id,
                    json!({
                        "success": result.succeeded,
                        "output": result.stdout,
                        "error": error,
                        "files_created": result.created_files,
                    }),
                );
                outcome.execution = Some(result);
                Ok(outcome)
            }
            other => Err(EngineError::ToolDispatch(format!("unknown tool: {}", other))),
        }
    }
}

/// Resolve all calls of one round concurrently, returning outcomes in request order.
///
/// Each call runs in its own task, so a panicking handler only fails its own call.
pub async fn dispatch_all(dispatcher: &Arc<ToolDispatcher>, calls: &[ToolCall]) -> Vec<ToolOutcome> {
    let handles: Vec<_> = calls
        .iter()
        .map(|call| {
            let dispatcher = Arc::clone(dispatcher);
            let call = call.clone();
            tokio::spawn(async move { dispatcher.dispatch(&call).await })
        })
        .collect();

    futures::future::join_all(handles)
        .await
        .into_iter()
        .zip(calls)
        .map(|(joined, call)| {
            joined.unwrap_or_else(|e| {
                let error =
                    EngineError::ToolDispatch(format!("tool {} did not complete: {}", call.name, e));
                warn!("{}", error);
                ToolOutcome::error(&call.id, &error)
            })
        })
        .collect()
}

fn decode_arguments<T: for<'de> Deserialize<'de>>(call: &ToolCall) -> Result<T, EngineError> {
    let raw = if call.arguments.trim().is_empty() {
        "{}"
    } else {
        call.arguments.as_str()
    };
    serde_json::from_str(raw).map_err(|e| {
        EngineError::ToolDispatch(format!("invalid arguments for {}: {}", call.name, e))
    })
}
