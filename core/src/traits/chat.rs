use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// A stateful conversation with a language model.
///
/// `start` installs the system instruction and resets the history; every
/// `ask` appends the prompt and the model's reply to it.
#[async_trait]
pub trait ChatSession: Send {
    async fn start(&mut self, system_prompt: &str) -> anyhow::Result<()>;

    async fn ask(&mut self, text: &str) -> anyhow::Result<String>;
}
