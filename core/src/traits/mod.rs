pub mod chat;
pub mod tool;

pub use chat::{ChatMessage, ChatSession};
pub use tool::{Tool, ToolContent, ToolDescriptor, content_payload};
