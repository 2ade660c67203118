//! External worker invocation.
//!
//! A worker is a script that receives one JSON payload on its command line
//! and answers with one JSON document on stdout. [`WorkerInvoker`] is the
//! seam the dispatcher calls through; [`SubprocessInvoker`] is the real
//! implementation.

use async_trait::async_trait;
use rmcp::model::JsonObject;
use serde_json::Value;

use crate::failure::{Failure, FailureKind};
use crate::types::{ActionName, WorkerId};

mod subprocess;
#[cfg(test)]
pub(crate) mod test_support;

pub use subprocess::SubprocessInvoker;

/// One request to a worker. `payload` always carries `action`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerCall {
    pub worker: WorkerId,
    pub action: ActionName,
    pub payload: JsonObject,
}

/// Result of one worker invocation, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    Success(Value),
    Failure(Failure),
}

impl WorkerOutcome {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        WorkerOutcome::Failure(Failure::new(kind, message))
    }

    /// The failure kind, if this outcome is a failure.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            WorkerOutcome::Success(_) => None,
            WorkerOutcome::Failure(failure) => Some(failure.kind),
        }
    }
}

#[async_trait]
pub trait WorkerInvoker: Send + Sync {
    /// Run `call` to completion. Never errors: every failure mode is
    /// classified into [`WorkerOutcome::Failure`].
    async fn invoke(&self, call: WorkerCall) -> WorkerOutcome;
}
