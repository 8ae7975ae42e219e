pub mod config;
pub mod driver;
pub mod error;
pub mod generate;
pub mod mover;
pub mod plan;
pub mod throttle;

pub use crate::driver::{BatchOutcome, DriverConfig, Reassigner, RunSummary};
pub use crate::error::{ReassignError, Result};
pub use crate::generate::{decompose, generate, rotate};
pub use crate::mover::{KafkaReassignTool, Mover, ToolOutput, VerifyReport};
pub use crate::plan::{Batch, PartitionAssignment, PartitionIdx, Plan, ReplicaSet};
pub use crate::throttle::{Throttle, ThrottleSchedule, ThrottleSource};

#[macro_use]
extern crate serde_derive;

/// Runs `plan` against the Kafka installation described by `config`.
pub async fn reassign_with_config(
    config: &config::ReassignConfig,
    label: &str,
    plan: &[Batch],
) -> anyhow::Result<RunSummary> {
    config.validate()?;
    let zookeeper = config.resolve_zookeeper()?;
    let throttle = config.throttle_source()?;
    let schedule = throttle.current_schedule()?;

    tracing::info!(kafka_home = %config.kafka_home.display(), "using kafka root");
    tracing::info!(zookeeper = %zookeeper, "using zookeeper");
    tracing::info!(%schedule, first = schedule.first(), "using throttle");
    tracing::info!(retry_after = ?config.retry_after(), "retry after");

    let mover = KafkaReassignTool::new(&config.kafka_home, &zookeeper);
    let reassigner = Reassigner::new(mover, throttle, config.driver_config(label));
    Ok(reassigner.run(plan).await?)
}
