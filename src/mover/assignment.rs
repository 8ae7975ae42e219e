use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;
use crate::plan::{PartitionAssignment, PartitionIdx};

const ASSIGNMENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssignmentDocument {
    pub version: u32,
    pub partitions: Vec<AssignmentEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AssignmentEntry {
    pub topic: String,
    pub partition: PartitionIdx,
    pub replicas: Vec<i32>,
}

impl AssignmentDocument {
    pub fn new(batch: &[PartitionAssignment]) -> Self {
        Self {
            version: ASSIGNMENT_VERSION,
            partitions: batch
                .iter()
                .map(|a| AssignmentEntry {
                    topic: a.topic.clone(),
                    partition: a.partition,
                    replicas: a.to.clone(),
                })
                .collect(),
        }
    }
}

/// Reassignment JSON handed to the external tool. The file lives as long as
/// this value and is removed on drop.
#[derive(Debug)]
pub struct AssignmentFile {
    file: NamedTempFile,
}

impl AssignmentFile {
    #[tracing::instrument(skip(batch))]
    pub fn create(label: &str, batch_idx: usize, batch: &[PartitionAssignment]) -> Result<Self> {
        let document = AssignmentDocument::new(batch);
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-{}-", label, batch_idx))
            .suffix(".json")
            .tempfile()?;
        serde_json::to_writer_pretty(&mut file, &document)?;
        file.flush()?;

        tracing::info!(path = %file.path().display(), "temp file");
        tracing::info!(content = %serde_json::to_string(&document)?, "assignment");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_replicas_from_target() -> anyhow::Result<()> {
        let batch = vec![
            PartitionAssignment::new("T", 0, vec![11, 12, 13]).with_from(vec![1, 2, 3]),
            PartitionAssignment::new("T", 1, vec![12, 13, 11]),
        ];
        let file = AssignmentFile::create("plan", 3, &batch)?;

        let name = file.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("plan-3-"));

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(file.path())?)?;
        assert_eq!(
            serde_json::json!({
                "version": 1,
                "partitions": [
                    {"topic": "T", "partition": 0, "replicas": [11, 12, 13]},
                    {"topic": "T", "partition": 1, "replicas": [12, 13, 11]}
                ]
            }),
            value
        );
        Ok(())
    }

    #[test]
    fn removed_on_drop() -> anyhow::Result<()> {
        let file = AssignmentFile::create("plan", 0, &[PartitionAssignment::new("T", 0, vec![1])])?;
        let path = file.path().to_path_buf();
        assert!(path.exists());
        drop(file);
        assert!(!path.exists());
        Ok(())
    }
}
