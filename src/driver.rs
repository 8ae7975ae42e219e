use std::path::Path;
use std::time::Duration;

use crate::error::{ReassignError, Result};
use crate::mover::output::{self, ALREADY_RUNNING_MESSAGE, STARTED_MESSAGE};
use crate::mover::{AssignmentFile, Mover, ToolOutput};
use crate::plan::{validate_batch, Batch, PartitionAssignment};
use crate::throttle::{Throttle, ThrottleSchedule};

pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Pause between two verify calls.
    pub retry_after: Duration,
    /// Prefix of the temporary assignment files.
    pub label: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            retry_after: DEFAULT_RETRY_AFTER,
            label: "reassignment".to_string(),
        }
    }
}

/// Where a batch is while [`Reassigner::reassign`] drives it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum BatchState {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The first verify already reported every partition as moved.
    AlreadyCompleted,
    /// Completed after `polls` verify rounds.
    Completed { polls: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub already_completed: usize,
    pub migrated: usize,
}

/// Drives a plan through a [`Mover`], one batch at a time.
#[derive(Debug)]
pub struct Reassigner<M, T> {
    mover: M,
    throttle: T,
    config: DriverConfig,
}

impl<M: Mover, T: Throttle> Reassigner<M, T> {
    pub fn new(mover: M, throttle: T, config: DriverConfig) -> Self {
        Self {
            mover,
            throttle,
            config,
        }
    }

    pub fn mover(&self) -> &M {
        &self.mover
    }

    /// Runs every batch in order and stops at the first error. The throttle
    /// schedule is read again before each batch.
    #[tracing::instrument(skip_all, fields(batches = plan.len()))]
    pub async fn run(&self, plan: &[Batch]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for (idx, batch) in plan.iter().enumerate() {
            let schedule = self.throttle.current_schedule()?;
            tracing::info!(batch = idx, %schedule, "throttle");
            match self.reassign(idx, batch, &schedule).await? {
                BatchOutcome::AlreadyCompleted => summary.already_completed += 1,
                BatchOutcome::Completed { .. } => summary.migrated += 1,
            }
        }
        tracing::info!(?summary, "plan completed");
        Ok(summary)
    }

    /// Moves one batch to completion.
    ///
    /// A batch whose partitions all verify as completed is not submitted
    /// again, so an interrupted run can simply be restarted. If nothing is in
    /// progress the batch is started with the first throttle of `schedule`;
    /// otherwise the running reassignment is adopted. Every second poll
    /// escalates the throttle until the schedule has been walked.
    #[tracing::instrument(skip(self, batch, schedule), fields(partitions = batch.len()))]
    pub async fn reassign(
        &self,
        idx: usize,
        batch: &[PartitionAssignment],
        schedule: &ThrottleSchedule,
    ) -> Result<BatchOutcome> {
        validate_batch(idx, batch)?;
        let file = AssignmentFile::create(&self.config.label, idx, batch)?;
        let expected = batch.len();
        let mut state = BatchState::NotStarted;

        let report = self.mover.verify(file.path()).await?;
        if report.completed >= expected {
            tracing::info!("reassignment completed successfully");
            return Ok(BatchOutcome::AlreadyCompleted);
        }

        if report.in_progress == 0 {
            if report.completed > 0 {
                tracing::info!(
                    completed = ?report.completed_partitions,
                    "partial reassignment done for partitions"
                );
            }
            tracing::info!(throttle = schedule.first(), "starting reassignment of partitions");
            self.start(file.path(), schedule.first()).await?;
            tracing::info!("started reassignment of partitions");
        } else {
            tracing::info!(
                in_progress = report.in_progress,
                "reassignment already running, waiting for it"
            );
        }
        transition(&mut state, BatchState::InProgress);

        let mut polls = 0;
        loop {
            tokio::time::sleep(self.config.retry_after).await;
            let report = self.mover.verify(file.path()).await?;
            polls += 1;

            if report.completed >= expected {
                transition(&mut state, BatchState::Completed);
                tracing::info!(polls, "reassignment completed successfully");
                return Ok(BatchOutcome::Completed { polls });
            }
            if report.in_progress == 0 {
                return Err(ReassignError::StalledMigration {
                    batch: idx,
                    completed: report.completed,
                    expected,
                    stdout: report.output.stdout_text(),
                    stderr: report.output.stderr_text(),
                });
            }
            tracing::info!(
                in_progress = report.in_progress,
                completed = report.completed,
                "reassignment is still in progress, retrying after {:?}",
                self.config.retry_after
            );

            if polls % 2 == 0 && polls < schedule.escalation_limit() {
                let throttle = schedule.at(polls / 2);
                tracing::info!(throttle, "changing throttle");
                self.change_throttle(file.path(), throttle).await?;
                tracing::info!(throttle, "changed throttle successfully");
            }
        }
    }

    async fn start(&self, assignment: &Path, throttle: u64) -> Result<()> {
        let output = self.mover.execute(assignment, throttle).await?;
        if !output::is_started(&output.stdout) {
            tracing::info!(output = %output.stdout_text(), "couldn't find the started message");
            return Err(mismatch(STARTED_MESSAGE, output));
        }
        Ok(())
    }

    async fn change_throttle(&self, assignment: &Path, throttle: u64) -> Result<()> {
        let output = self.mover.execute(assignment, throttle).await?;
        if !output::is_throttle_changed(&output.stdout) {
            tracing::info!(output = %output.stdout_text(), "couldn't find the existing assignment message");
            return Err(mismatch(ALREADY_RUNNING_MESSAGE, output));
        }
        Ok(())
    }
}

fn transition(state: &mut BatchState, next: BatchState) {
    tracing::debug!(from = ?*state, to = ?next, "batch state");
    *state = next;
}

fn mismatch(expected: &'static str, output: ToolOutput) -> ReassignError {
    ReassignError::ProtocolMismatch {
        expected,
        stdout: output.stdout_text(),
        stderr: output.stderr_text(),
    }
}
