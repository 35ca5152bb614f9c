//! Query adapters: run cluster queries through `kubectl` or replay recorded output.
//!
//! This is the only crate that spawns external processes. It never retries: a failed query is
//! reported once and the caller fails that control closed.

#![forbid(unsafe_code)]

mod kubectl;
mod replay;

use camino::Utf8PathBuf;
use kubeguard_domain::model::{QueryFailure, QueryFailureKind};
use kubeguard_domain::policy::QuerySpec;
use std::time::Duration;

pub use kubectl::{KubectlRunner, kubectl_args};
pub use replay::ReplayRunner;

/// Raw output of a successful query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("API server unreachable: {stderr}")]
    Unreachable { stderr: String },
    #[error("`{command}` timed out after {}s", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },
    #[error("no recorded output at {path}: {source}")]
    Replay {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl QueryError {
    pub fn kind(&self) -> QueryFailureKind {
        match self {
            QueryError::Spawn { .. } => QueryFailureKind::Spawn,
            QueryError::Exit { .. } | QueryError::Io { .. } => QueryFailureKind::Exit,
            QueryError::Unreachable { .. } => QueryFailureKind::Unreachable,
            QueryError::Timeout { .. } => QueryFailureKind::Timeout,
            QueryError::Replay { .. } => QueryFailureKind::Replay,
        }
    }
}

impl From<&QueryError> for QueryFailure {
    fn from(err: &QueryError) -> Self {
        QueryFailure::new(err.kind(), err.to_string())
    }
}

/// Executes a query for a control.
///
/// Implementations must be shareable across threads: controls are evaluated in parallel.
pub trait QueryRunner: Send + Sync {
    fn invoke(&self, spec: &QuerySpec) -> Result<RawOutput, QueryError>;

    /// Human-readable rendering of what `invoke` would run (for logs and `list`).
    fn describe(&self, spec: &QuerySpec) -> String;
}
