//! Fake calculations directories for exercising the subprocess path.
//!
//! Workers are shell scripts run by `sh`, so the tests need no Python.

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::WorkerConfig;
use crate::worker::SubprocessInvoker;

/// Writes its payload argument straight back to stdout.
pub(crate) const ECHO_WORKER: &str = "printf '%s' \"$1\"\n";

pub(crate) struct FakeCalculations {
    dir: TempDir,
}

impl FakeCalculations {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp calculations dir"),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `<worker>.sh` with the given shell body.
    pub(crate) fn script(&self, worker: &str, body: &str) -> &Self {
        let path = self.path().join(format!("{worker}.sh"));
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write fake worker");
        self
    }

    pub(crate) fn config(&self) -> WorkerConfig {
        WorkerConfig::new(self.path())
            .with_fallback_interpreter("sh")
            .with_script_extension("sh")
            .with_timeout(Duration::from_secs(10))
    }

    pub(crate) fn invoker(&self) -> SubprocessInvoker {
        SubprocessInvoker::new(self.config())
    }
}
