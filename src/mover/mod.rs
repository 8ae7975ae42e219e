use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::plan::PartitionIdx;

pub mod assignment;
mod kafka;
pub mod output;
#[cfg(test)]
pub(crate) mod test;

pub use assignment::AssignmentFile;
pub use kafka::KafkaReassignTool;

/// Captured, trimmed output of one tool invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ToolOutput {
    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }

    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }
}

/// Status of the partitions named in an assignment file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub in_progress: usize,
    pub completed: usize,
    pub completed_partitions: Vec<(String, PartitionIdx)>,
    pub output: ToolOutput,
}

impl VerifyReport {
    pub fn from_output(output: ToolOutput) -> Self {
        let counts = output::parse_verify(&output.stdout);
        Self {
            in_progress: counts.in_progress,
            completed: counts.completed,
            completed_partitions: counts.completed_partitions,
            output,
        }
    }
}

/// The external process that actually moves replicas.
#[async_trait]
pub trait Mover: Send + Sync {
    /// Reports progress of the reassignment described by `assignment`.
    async fn verify(&self, assignment: &Path) -> Result<VerifyReport>;

    /// Submits `assignment` with the given replication throttle. Against an
    /// already running reassignment this only updates the throttle.
    async fn execute(&self, assignment: &Path, throttle: u64) -> Result<ToolOutput>;
}
