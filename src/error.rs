use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReassignError>;

#[derive(Debug, Error)]
pub enum ReassignError {
    /// The external tool exited non-zero (or was killed).
    #[error("{command} failed\ncode: {code:?}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    ExternalTool {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The tool ran but did not print the confirmation we rely on. The state
    /// of the cluster is unknown at this point.
    #[error("expected \"{expected}\" in tool output\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    ProtocolMismatch {
        expected: &'static str,
        stdout: String,
        stderr: String,
    },

    #[error(
        "reassignment of batch {batch} failed: {completed}/{expected} completed, none in progress\nstdout:\n{stdout}\nstderr:\n{stderr}"
    )]
    StalledMigration {
        batch: usize,
        completed: usize,
        expected: usize,
        stdout: String,
        stderr: String,
    },

    #[error("invalid plan: {error_msg}")]
    InvalidPlan { error_msg: String },

    #[error("invalid throttle: {error_msg}")]
    InvalidThrottle { error_msg: String },

    #[error("configuration error in {file_path}: {error_msg}")]
    Config { file_path: String, error_msg: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReassignError {
    pub(crate) fn invalid_plan(error_msg: impl Into<String>) -> Self {
        ReassignError::InvalidPlan {
            error_msg: error_msg.into(),
        }
    }

    pub(crate) fn invalid_throttle(error_msg: impl Into<String>) -> Self {
        ReassignError::InvalidThrottle {
            error_msg: error_msg.into(),
        }
    }
}
