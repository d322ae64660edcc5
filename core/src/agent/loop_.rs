use crate::agent::catalog::{build_catalog, system_instruction};
use crate::agent::reply::{CallRequest, Reply, parse_reply};
use crate::manager::ToolClientManager;
use crate::traits::ChatSession;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_MAX_STEPS: usize = 8;

pub const STEP_LIMIT_MESSAGE: &str = "I could not complete the task within the step limit.";

const FORMAT_CORRECTION: &str = "The format is not valid. You must reply with ONLY ### CALL {...} ### or ### FINAL {...} ###. Try again.";

/// One tool dispatch observed during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEntry {
    Call {
        server_id: String,
        name: String,
        arguments: Value,
        result: Value,
    },
    Error {
        server_id: String,
        name: String,
        arguments: Value,
        error: String,
    },
}

impl TraceEntry {
    pub fn server_id(&self) -> &str {
        match self {
            Self::Call { server_id, .. } | Self::Error { server_id, .. } => server_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Call { name, .. } | Self::Error { name, .. } => name,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub final_text: String,
    pub trace: Vec<TraceEntry>,
    /// False only when the step budget ran out.
    pub completed: bool,
}

pub struct AgentLoop {
    chat: Box<dyn ChatSession>,
    manager: Arc<ToolClientManager>,
    max_steps: usize,
    started: bool,
}

impl AgentLoop {
    pub fn new(chat: Box<dyn ChatSession>, manager: Arc<ToolClientManager>) -> Self {
        Self {
            chat,
            manager,
            max_steps: DEFAULT_MAX_STEPS,
            started: false,
        }
    }

    pub fn with_max_steps(mut self, max: usize) -> Self {
        self.max_steps = max;
        self
    }

    /// Build the catalog and start the chat session. Runs at most once.
    pub async fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }

        let catalog = build_catalog(&self.manager).await;
        self.chat
            .start(&system_instruction(&catalog))
            .await
            .context("Failed to start chat session")?;
        self.started = true;
        info!(max_steps = self.max_steps, "Agent started");
        Ok(())
    }

    /// Drive the model until it answers or the step budget runs out.
    ///
    /// Each step is one chat round trip. Tool failures and malformed replies
    /// are fed back to the model; only chat-service errors are returned.
    pub async fn run(&mut self, user_text: &str) -> Result<AgentOutcome> {
        self.start().await?;

        let mut trace = Vec::new();
        let mut prompt = format!("User: {}\nRemember to answer with CALL/FINAL.", user_text);

        for step in 1..=self.max_steps {
            let reply = self
                .chat
                .ask(&prompt)
                .await
                .with_context(|| format!("Chat request failed at step {}", step))?;

            prompt = match parse_reply(&reply) {
                Reply::Final(text) => {
                    info!(step, calls = trace.len(), "Agent finished");
                    return Ok(AgentOutcome {
                        final_text: text,
                        trace,
                        completed: true,
                    });
                }
                Reply::Call(call) => self.dispatch(call, &mut trace).await,
                Reply::InvalidCall(reason) => {
                    debug!(step, %reason, "Rejected CALL payload");
                    format!(
                        "The CALL JSON is not valid ({}). Retry using the documented format.",
                        reason
                    )
                }
                Reply::Malformed => {
                    debug!(step, "Reply matched no marker");
                    FORMAT_CORRECTION.to_string()
                }
            };
        }

        warn!(max_steps = self.max_steps, "Agent step budget exhausted");
        Ok(AgentOutcome {
            final_text: STEP_LIMIT_MESSAGE.to_string(),
            trace,
            completed: false,
        })
    }

    /// Run one tool call, record it and return the next prompt for the model.
    async fn dispatch(&self, call: CallRequest, trace: &mut Vec<TraceEntry>) -> String {
        let CallRequest {
            server_id,
            name,
            arguments,
        } = call;

        match self
            .manager
            .call_tool(&server_id, &name, arguments.clone())
            .await
        {
            Ok(result) => {
                let observation =
                    serde_json::to_string(&result).unwrap_or_else(|_| result.to_string());
                trace.push(TraceEntry::Call {
                    server_id,
                    name,
                    arguments,
                    result,
                });
                format!(
                    "OBSERVATION:\n{}\nContinue. Remember to answer with CALL/FINAL.",
                    observation
                )
            }
            Err(e) => {
                warn!(server = %server_id, tool = %name, "Tool call failed: {}", e);
                let prompt = format!(
                    "ERROR running tool {}:{}: {}. Fix the arguments or pick another tool and retry with CALL.",
                    server_id, name, e
                );
                trace.push(TraceEntry::Error {
                    server_id,
                    name,
                    arguments,
                    error: e.to_string(),
                });
                prompt
            }
        }
    }
}
