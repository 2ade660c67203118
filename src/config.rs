use anyhow::{Context, Result};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

/// Overrides the calculations directory.
pub const CALCULATIONS_DIR_ENV: &str = "JYOTISH_CALCULATIONS_DIR";
/// System interpreter used when no project-local one exists.
pub const PYTHON_ENV: &str = "JYOTISH_PYTHON";
/// Per-call worker deadline, in seconds.
pub const WORKER_TIMEOUT_ENV: &str = "JYOTISH_WORKER_TIMEOUT_SECS";

pub const DEFAULT_FALLBACK_INTERPRETER: &str = "python3";
pub const DEFAULT_SCRIPT_EXTENSION: &str = "py";
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(120);

/// How many directories above the executable are searched for `calculations`.
const INSTALL_SEARCH_DEPTH: usize = 3;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directory holding the worker scripts; also the workers' cwd.
    pub calculations_dir: PathBuf,
    /// Project-local interpreter, relative to `calculations_dir`.
    pub local_interpreter: PathBuf,
    pub fallback_interpreter: String,
    pub script_extension: String,
    pub timeout: Duration,
}

impl WorkerConfig {
    /// Config rooted at `calculations_dir` with built-in defaults for the rest.
    pub fn new(calculations_dir: impl Into<PathBuf>) -> Self {
        Self {
            calculations_dir: calculations_dir.into(),
            local_interpreter: default_local_interpreter(),
            fallback_interpreter: DEFAULT_FALLBACK_INTERPRETER.to_string(),
            script_extension: DEFAULT_SCRIPT_EXTENSION.to_string(),
            timeout: DEFAULT_WORKER_TIMEOUT,
        }
    }

    /// Build from the environment, locating the calculations directory
    /// relative to the running executable unless overridden.
    pub fn from_env() -> Result<Self> {
        let calculations_dir = match env::var_os(CALCULATIONS_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => calculations_dir_from_install()?,
        };

        let mut config = Self::new(calculations_dir);
        if let Ok(python) = env::var(PYTHON_ENV) {
            config.fallback_interpreter = python;
        }
        if let Ok(raw) = env::var(WORKER_TIMEOUT_ENV) {
            config.timeout = parse_timeout_secs(&raw)
                .with_context(|| format!("invalid {WORKER_TIMEOUT_ENV}"))?;
        }
        Ok(config)
    }

    pub fn with_local_interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_interpreter = path.into();
        self
    }

    pub fn with_fallback_interpreter(mut self, name: impl Into<String>) -> Self {
        self.fallback_interpreter = name.into();
        self
    }

    pub fn with_script_extension(mut self, ext: impl Into<String>) -> Self {
        self.script_extension = ext.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_local_interpreter() -> PathBuf {
    if cfg!(windows) {
        Path::new("venv").join("Scripts").join("python.exe")
    } else {
        Path::new("venv").join("bin").join("python")
    }
}

/// Parse a positive number of seconds.
pub fn parse_timeout_secs(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("expected a whole number of seconds, got `{raw}`"))?;
    if secs == 0 {
        anyhow::bail!("worker timeout must be at least one second");
    }
    Ok(Duration::from_secs(secs))
}

/// Locate `calculations` relative to the current executable.
pub fn calculations_dir_from_install() -> Result<PathBuf> {
    let exe = env::current_exe().context("could not determine the server executable path")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    Ok(resolve_calculations_dir(&exe))
}

/// Walk up from the executable's directory looking for a `calculations`
/// child. Falls back to `<exe dir>/../../calculations`, the layout of a
/// `target/<profile>` build; a missing directory is reported per call.
pub fn resolve_calculations_dir(exe: &Path) -> PathBuf {
    let exe_dir = exe.parent().unwrap_or_else(|| Path::new("."));

    for dir in exe_dir.ancestors().take(INSTALL_SEARCH_DEPTH + 1) {
        let candidate = dir.join("calculations");
        if candidate.is_dir() {
            return candidate;
        }
    }

    exe_dir.join("..").join("..").join("calculations")
}
