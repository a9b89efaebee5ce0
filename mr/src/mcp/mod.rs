//! MCP session layer for mcprepl
//!
//! One [`McpSession`] per connected server process, a [`SessionRegistry`]
//! owning all of them in connection order, and a [`ToolDispatcher`] routing
//! tool calls to the owning session. The wire protocol (framing, handshake,
//! request correlation) is rmcp's job; this module only drives it.

mod dispatch;
mod error;
mod registry;
mod session;

pub use dispatch::{ToolDispatch, ToolDispatcher};
pub use error::{ConnectionError, DispatchError, InvocationError};
pub use registry::{CatalogEntry, SessionRegistry};
pub use session::{McpSession, SessionState, ToolOutcome};

#[cfg(test)]
pub(crate) use session::stub::StubTransport;
