use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {command}: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Could not decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Command timed out after {seconds}s: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("Operation interrupted")]
    Cancelled,

    #[error("Input closed")]
    InputClosed,

    #[error("Manifest not found: {0}")]
    ManifestMissing(PathBuf),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database not ready: {0}")]
    DatabaseNotReady(String),

    #[error("Job {job} failed")]
    JobFailed { job: String, log: String },

    #[error("Failed to scale deployments to {replicas} replicas: {stderr}")]
    ScaleFailed { replicas: u32, stderr: String },

    #[error("Step '{step}' failed after {completed}/{total} steps: {source}")]
    StepFailed {
        step: String,
        completed: usize,
        total: usize,
        #[source]
        source: Box<ConsoleError>,
    },
}

impl ConsoleError {
    /// Whether trying the same operation again later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConsoleError::Timeout { .. }
            | ConsoleError::DatabaseNotReady(_)
            | ConsoleError::CommandFailed { .. }
            | ConsoleError::JobFailed { .. }
            | ConsoleError::ScaleFailed { .. } => true,
            ConsoleError::StepFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
