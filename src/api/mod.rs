//! API layer - MCP tool surface

pub mod args;
pub mod server;

pub use server::{KnowledgeBaseMcpServer, SERVER_NAME};
