//! Plan generation and single-replica decomposition. Everything here is pure
//! and deterministic.

use std::collections::HashSet;

use crate::error::{ReassignError, Result};
use crate::plan::{validate_batch, Batch, PartitionAssignment, PartitionIdx, Plan, ReplicaSet};

/// Left-rotates `pool` by `i mod len(pool)` positions.
pub fn rotate(pool: &[i32], i: usize) -> ReplicaSet {
    if pool.is_empty() {
        return Vec::new();
    }
    let mut replicas = pool.to_vec();
    replicas.rotate_left(i % pool.len());
    replicas
}

/// Assigns the partition at input position `i` the replica order
/// `rotate(pool, i)` so leadership is spread round-robin over the pool, and
/// groups the assignments into batches of `parallelism`.
pub fn generate(topic: &str, partitions: &[u32], pool: &[i32], parallelism: usize) -> Result<Plan> {
    if parallelism == 0 {
        return Err(ReassignError::invalid_plan("parallelism must be at least 1"));
    }
    if pool.is_empty() {
        return Err(ReassignError::invalid_plan("replica pool is empty"));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = partitions.iter().find(|p| !seen.insert(**p)) {
        return Err(ReassignError::invalid_plan(format!(
            "partition {} listed more than once",
            dup
        )));
    }

    let mut plan = Vec::new();
    let mut batch = Vec::new();
    for (i, partition) in partitions.iter().enumerate() {
        batch.push(PartitionAssignment {
            topic: topic.to_string(),
            partition: PartitionIdx(*partition),
            to: rotate(pool, i),
            from: None,
        });
        if (i + 1) % parallelism == 0 {
            plan.push(std::mem::take(&mut batch));
        }
    }
    if !batch.is_empty() {
        plan.push(batch);
    }

    tracing::debug!(topic, partitions = partitions.len(), batches = plan.len(), "generated plan");
    Ok(plan)
}

/// Splits every batch from `start_index` on into one sub-batch per replica
/// position. Sub-batch `k` has positions `0..=k` at their target and the rest
/// still at their source, so each step moves a single replica per partition.
pub fn decompose(plans: &[Batch], start_index: usize) -> Result<Vec<Batch>> {
    let mut steps = Vec::new();
    for (idx, batch) in plans.iter().enumerate().skip(start_index) {
        let width = batch_width(idx, batch)?;
        let mut current: Vec<ReplicaSet> = batch
            .iter()
            .map(|a| a.from.clone().unwrap_or_default())
            .collect();

        for position in 0..width {
            let mut step = Vec::with_capacity(batch.len());
            for (assignment, replicas) in batch.iter().zip(current.iter_mut()) {
                let previous = replicas.clone();
                replicas[position] = assignment.to[position];
                step.push(PartitionAssignment {
                    topic: assignment.topic.clone(),
                    partition: assignment.partition,
                    to: replicas.clone(),
                    from: Some(previous),
                });
            }
            steps.push(step);
        }
    }
    Ok(steps)
}

fn batch_width(idx: usize, batch: &[PartitionAssignment]) -> Result<usize> {
    validate_batch(idx, batch)?;
    if batch.is_empty() {
        return Err(ReassignError::invalid_plan(format!("batch {} is empty", idx)));
    }
    let mut width = None;
    for assignment in batch {
        let from = assignment.from.as_ref().ok_or_else(|| {
            ReassignError::invalid_plan(format!(
                "batch {}: partition {}-{} has no source replicas",
                idx, assignment.topic, assignment.partition
            ))
        })?;
        if from.is_empty() || from.len() != assignment.to.len() {
            return Err(ReassignError::invalid_plan(format!(
                "batch {}: partition {}-{} moves {} replicas to {}",
                idx,
                assignment.topic,
                assignment.partition,
                from.len(),
                assignment.to.len()
            )));
        }
        match width {
            None => width = Some(from.len()),
            Some(w) if w != from.len() => {
                return Err(ReassignError::invalid_plan(format!(
                    "batch {}: mixed replication factors {} and {}",
                    idx,
                    w,
                    from.len()
                )))
            }
            Some(_) => {}
        }
    }
    Ok(width.unwrap_or(0))
}
