//! Tool dispatch: resolve → validate → build the worker call → invoke →
//! shape the response.
//!
//! The dispatcher owns nothing mutable. It holds the registry and the
//! invoker behind `Arc`s, so concurrent calls need no locking and never see
//! each other's state.

use std::sync::Arc;
use std::time::Instant;

use rmcp::model::JsonObject;
use tracing::{info, warn};

use crate::failure::FailureKind;
use crate::tools::ToolRegistry;
use crate::worker::{WorkerInvoker, WorkerOutcome};

mod envelope;
#[cfg(all(test, unix))]
mod integration_tests;

pub use envelope::{ContentBlock, ResponseEnvelope};

/// One inbound tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub raw_arguments: JsonObject,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, raw_arguments: JsonObject) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_arguments,
        }
    }
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    invoker: Arc<dyn WorkerInvoker>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, invoker: Arc<dyn WorkerInvoker>) -> Self {
        Self { registry, invoker }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Handle one call. Always produces an envelope; failures become
    /// `isError` responses rather than errors.
    pub async fn dispatch(&self, request: InvocationRequest) -> ResponseEnvelope {
        let started = Instant::now();
        let tool_name = request.tool_name.clone();

        let outcome = self.resolve_and_invoke(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            WorkerOutcome::Success(_) => {
                info!(tool = %tool_name, elapsed_ms, "Tool call succeeded");
            }
            WorkerOutcome::Failure(failure) => {
                warn!(
                    tool = %tool_name,
                    kind = %failure.kind,
                    elapsed_ms,
                    "Tool call failed: {}",
                    failure.message.trim_end()
                );
            }
        }

        ResponseEnvelope::from_outcome(&outcome)
    }

    async fn resolve_and_invoke(&self, request: InvocationRequest) -> WorkerOutcome {
        let Some(descriptor) = self.registry.lookup(&request.tool_name) else {
            return WorkerOutcome::failure(
                FailureKind::UnknownTool,
                format!("Unknown tool: {}", request.tool_name),
            );
        };

        let args = match descriptor.validate(&request.raw_arguments) {
            Ok(args) => args,
            Err(violations) => {
                return WorkerOutcome::failure(
                    FailureKind::ValidationError,
                    format!("Invalid arguments for {}: {}", descriptor.name(), violations),
                );
            }
        };

        let call = descriptor.build_call(args);
        self.invoker.invoke(call).await
    }
}
