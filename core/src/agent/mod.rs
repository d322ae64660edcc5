pub mod catalog;
pub mod loop_;
pub mod reply;

pub use catalog::{build_catalog, render_catalog, system_instruction};
pub use loop_::{AgentLoop, AgentOutcome, STEP_LIMIT_MESSAGE, TraceEntry};
pub use reply::{CallRequest, Reply, parse_reply};
