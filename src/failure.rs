//! Failure taxonomy shared by the dispatcher and the worker invoker.
//!
//! Every way a tool call can go wrong ends up as a [`Failure`]; the
//! dispatcher turns it into an `isError` response, so nothing here is ever
//! raised to the transport.

use std::fmt;
use std::path::PathBuf;

use rmcp::model::JsonObject;
use serde::Serialize;

/// Classification of a failed tool call. None of these are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The caller asked for a tool that is not in the registry.
    UnknownTool,
    /// Arguments failed the tool's schema.
    ValidationError,
    /// The worker script does not exist at its resolved path.
    WorkerNotFound,
    /// The worker process could not be started.
    SpawnError,
    /// The worker ran and exited non-zero.
    WorkerError,
    /// The worker exited 0 but its stdout is not JSON.
    MalformedOutput,
    /// The worker exceeded its deadline and was killed.
    Timeout,
    /// The client cancelled the request; the worker was killed.
    Cancelled,
    /// Anything else: pipe errors, a panicking dispatch, serialization.
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnknownTool => "unknown_tool",
            FailureKind::ValidationError => "validation_error",
            FailureKind::WorkerNotFound => "worker_not_found",
            FailureKind::SpawnError => "spawn_error",
            FailureKind::WorkerError => "worker_error",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Internal => "internal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context kept for operators when a worker exits non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub script_path: PathBuf,
    pub interpreter_path: PathBuf,
    pub payload: JsonObject,
}

/// A classified failure with its caller-visible message.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub diagnostic: Option<Diagnostic>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_is_message_only() {
        let failure = Failure::new(FailureKind::WorkerError, "boom\n");
        assert_eq!(failure.to_string(), "boom\n");
        assert_eq!(failure.kind.to_string(), "worker_error");
    }

    #[test]
    fn test_diagnostic_serializes_camel_case() {
        let diagnostic = Diagnostic {
            exit_code: Some(2),
            script_path: PathBuf::from("/calc/chart_calculator.py"),
            interpreter_path: PathBuf::from("python3"),
            payload: json!({"action": "list"}).as_object().cloned().unwrap(),
        };
        let value = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(value["exitCode"], json!(2));
        assert_eq!(value["interpreterPath"], json!("python3"));
        assert_eq!(value["payload"]["action"], json!("list"));
    }
}
