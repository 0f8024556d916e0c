//! Error taxonomy for race simulation runs.

use std::path::PathBuf;

/// Errors that halt a race simulation run.
///
/// Recoverable per-iteration conditions (missing baseline profile, failed
/// batch) never surface as this type; the pipeline logs and skips them.
#[derive(Debug, thiserror::Error)]
pub enum RaceSimError {
    #[error("invalid settings: {0}")]
    Config(String),

    #[error("invalid catalog: {0}")]
    Catalog(String),

    #[error("unknown spec: {0}")]
    UnknownSpec(String),

    #[error("baseline profile not found: {}", .0.display())]
    ProfileNotFound(PathBuf),

    /// A result came back whose name no race in the batch owns. This means
    /// the batch builder and the resolver disagree about task names.
    #[error("result '{name}' does not belong to any race in the batch")]
    UnmatchedResult { name: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for race simulation operations.
pub type Result<T> = std::result::Result<T, RaceSimError>;

/// Errors produced by a batch executor.
///
/// Any of these abandons the current fight style / spec iteration only.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to start simulator '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    #[error("simulation timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("simulator exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    #[error("invalid simulator output: {0}")]
    InvalidOutput(String),

    #[error("incomplete results: {0}")]
    IncompleteResults(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("remote simulation failed: {0}")]
    Remote(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
