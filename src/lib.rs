// Core modules
mod config;
pub mod failure;
mod logging;
pub mod types;

// Dispatch pipeline
pub mod dispatcher;
pub mod server;
pub mod tools;
pub mod worker;

// Re-export key types and functions
pub use config::{
    CALCULATIONS_DIR_ENV, DEFAULT_WORKER_TIMEOUT, PYTHON_ENV, WORKER_TIMEOUT_ENV, WorkerConfig,
    calculations_dir_from_install, parse_timeout_secs, resolve_calculations_dir,
};
pub use dispatcher::{Dispatcher, InvocationRequest, ResponseEnvelope};
pub use failure::{Failure, FailureKind};
pub use logging::{DEFAULT_LOG_DIRECTIVES, init_tracing, log_filter};
pub use server::{McpServer, start_mcp_http};
pub use tools::{ToolRegistry, jyotish_catalog};
pub use worker::{SubprocessInvoker, WorkerInvoker};

use anyhow::Result;
use std::sync::Arc;

/// Convenience function to create a fully configured MCP server.
///
/// Builds the Jyotish catalog, a subprocess invoker over `config` and the
/// dispatcher joining them, and returns a McpServer that implements rmcp's
/// ServerHandler.
pub fn create_server(config: WorkerConfig) -> Result<Arc<McpServer>> {
    let registry = Arc::new(jyotish_catalog()?);
    let invoker: Arc<dyn WorkerInvoker> = Arc::new(SubprocessInvoker::new(config));

    let dispatcher = Arc::new(Dispatcher::new(registry, invoker));

    Ok(Arc::new(McpServer::new(dispatcher)))
}
