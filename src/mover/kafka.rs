use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ReassignError, Result};
use crate::mover::output::to_lines;
use crate::mover::{Mover, ToolOutput, VerifyReport};

const REASSIGN_SCRIPT: &str = "bin/kafka-reassign-partitions.sh";

/// Runs `kafka-reassign-partitions.sh` from a Kafka installation.
#[derive(Clone, Debug)]
pub struct KafkaReassignTool {
    script: PathBuf,
    zookeeper: String,
}

impl KafkaReassignTool {
    pub fn new<P: AsRef<Path>>(kafka_home: P, zookeeper: &str) -> Self {
        Self::with_script(kafka_home.as_ref().join(REASSIGN_SCRIPT), zookeeper)
    }

    pub fn with_script<P: AsRef<Path>>(script: P, zookeeper: &str) -> Self {
        Self {
            script: script.as_ref().to_path_buf(),
            zookeeper: zookeeper.to_string(),
        }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    fn args(&self, assignment: &Path) -> Vec<OsString> {
        vec![
            "--zookeeper".into(),
            self.zookeeper.clone().into(),
            "--reassignment-json-file".into(),
            assignment.as_os_str().to_owned(),
        ]
    }

    async fn run(&self, args: Vec<OsString>) -> Result<ToolOutput> {
        tracing::debug!(script = %self.script.display(), ?args, "run");
        let out = Command::new(&self.script).args(&args).output().await?;
        let output = ToolOutput {
            stdout: to_lines(&String::from_utf8_lossy(&out.stdout)),
            stderr: to_lines(&String::from_utf8_lossy(&out.stderr)),
        };

        if !out.status.success() {
            let command = std::iter::once(self.script.as_os_str())
                .chain(args.iter().map(OsString::as_os_str))
                .map(|x| x.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ");
            return Err(ReassignError::ExternalTool {
                command,
                code: out.status.code(),
                stdout: output.stdout_text(),
                stderr: output.stderr_text(),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl Mover for KafkaReassignTool {
    #[tracing::instrument(skip(self))]
    async fn verify(&self, assignment: &Path) -> Result<VerifyReport> {
        let mut args = self.args(assignment);
        args.push("--verify".into());
        let report = VerifyReport::from_output(self.run(args).await?);
        tracing::debug!(
            output = %report.output.stdout_text(),
            in_progress = report.in_progress,
            completed = report.completed,
            "verify"
        );
        Ok(report)
    }

    #[tracing::instrument(skip(self))]
    async fn execute(&self, assignment: &Path, throttle: u64) -> Result<ToolOutput> {
        let mut args = self.args(assignment);
        args.push("--execute".into());
        args.push("--throttle".into());
        args.push(throttle.to_string().into());
        let output = self.run(args).await?;
        tracing::debug!(output = %output.stdout_text(), "execute");
        Ok(output)
    }
}
