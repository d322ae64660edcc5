pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod mcp;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AgentLoop, AgentOutcome, TraceEntry};
pub use config::*;
pub use error::{ToolError, ToolResult};
pub use logging::{InteractionLogger, LogEvent, LogRecord};
pub use manager::{BackendMode, ManagerOptions, ToolClientManager};
pub use providers::{OpenAiChat, create_chat};
pub use traits::*;
