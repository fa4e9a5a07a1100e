//! Wire types for the JSON-RPC 2.0 exchange and the MCP messages carried
//! on top of it.

mod mcp;
mod types;

pub use mcp::{
    CallToolParams, ContentItem, Implementation, InitializeResult, InvocationRequest,
    InvocationResult, ListToolsResult, ToolDescriptor,
};
pub use types::{Inbound, RpcError, RpcNotification, RpcRequest, RpcResponse};
