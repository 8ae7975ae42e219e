use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use derive_more::Display;

use crate::error::{ReassignError, Result};

/// Ordered replica ids of a partition. Position 0 is the preferred leader.
pub type ReplicaSet = Vec<i32>;

pub type Batch = Vec<PartitionAssignment>;

pub type Plan = Vec<Batch>;

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub struct PartitionIdx(pub u32);

/// Target placement of one partition, optionally with the placement it is
/// moving away from.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct PartitionAssignment {
    pub topic: String,
    pub partition: PartitionIdx,
    pub to: ReplicaSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ReplicaSet>,
}

impl PartitionAssignment {
    pub fn new(topic: &str, partition: u32, to: ReplicaSet) -> Self {
        Self {
            topic: topic.to_string(),
            partition: PartitionIdx(partition),
            to,
            from: None,
        }
    }

    pub fn with_from(mut self, from: ReplicaSet) -> Self {
        self.from = Some(from);
        self
    }
}

#[tracing::instrument]
pub fn load_plan(path: &Path) -> Result<Plan> {
    let file = std::fs::File::open(path)?;
    let plan: Plan = serde_json::from_reader(std::io::BufReader::new(file))?;
    validate_plan(&plan)?;
    tracing::debug!(batches = plan.len(), "loaded plan");
    Ok(plan)
}

pub fn write_plan<W: Write>(plan: &[Batch], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, plan)?;
    writeln!(writer)?;
    Ok(())
}

pub fn validate_plan(plan: &[Batch]) -> Result<()> {
    for (idx, batch) in plan.iter().enumerate() {
        validate_batch(idx, batch)?;
    }
    Ok(())
}

pub fn validate_batch(idx: usize, batch: &[PartitionAssignment]) -> Result<()> {
    let mut seen = HashSet::new();
    for assignment in batch {
        let key = (assignment.topic.as_str(), assignment.partition);
        if !seen.insert(key) {
            return Err(ReassignError::invalid_plan(format!(
                "batch {}: partition {}-{} appears more than once",
                idx, assignment.topic, assignment.partition
            )));
        }
        if assignment.to.is_empty() {
            return Err(ReassignError::invalid_plan(format!(
                "batch {}: partition {}-{} has no target replicas",
                idx, assignment.topic, assignment.partition
            )));
        }
        if let Some(from) = &assignment.from {
            if from.len() != assignment.to.len() {
                return Err(ReassignError::invalid_plan(format!(
                    "batch {}: partition {}-{} moves {} replicas to {}",
                    idx,
                    assignment.topic,
                    assignment.partition,
                    from.len(),
                    assignment.to.len()
                )));
            }
        }
    }
    Ok(())
}
