pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::ClientError;
pub use session::McpSession;
pub use transport::StdioTransport;
