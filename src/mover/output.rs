//! Text contract of `kafka-reassign-partitions.sh` (ZooKeeper-era releases).
//!
//! Every line is trimmed before it is matched. The rules are exact:
//!
//! * a verify line is considered only if it starts with [`REASSIGNMENT_PREFIX`];
//!   it is in progress if it ends with [`IN_PROGRESS_SUFFIX`] and completed
//!   if it ends with [`COMPLETED_SUFFIX`];
//! * `--execute` started a reassignment iff exactly one line contains
//!   [`STARTED_MESSAGE`];
//! * `--execute` against a running reassignment updated the throttle iff
//!   exactly one line contains [`ALREADY_RUNNING_MESSAGE`].
//!
//! A tool release that words any of this differently only needs this module
//! changed.

use std::sync::OnceLock;

use regex::Regex;

use crate::plan::PartitionIdx;

pub const REASSIGNMENT_PREFIX: &str = "Reassignment";
pub const IN_PROGRESS_SUFFIX: &str = "is still in progress";
pub const COMPLETED_SUFFIX: &str = "completed successfully";
pub const STARTED_MESSAGE: &str = "Successfully started reassignment of partitions";
pub const ALREADY_RUNNING_MESSAGE: &str = "There is an existing assignment running";

/// Trimmed, non-empty lines of a tool stream.
pub fn to_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyCounts {
    pub in_progress: usize,
    pub completed: usize,
    pub completed_partitions: Vec<(String, PartitionIdx)>,
}

pub fn parse_verify(stdout: &[String]) -> VerifyCounts {
    let mut counts = VerifyCounts::default();
    for line in stdout.iter().map(|l| l.trim()) {
        if !line.starts_with(REASSIGNMENT_PREFIX) {
            continue;
        }
        if line.ends_with(IN_PROGRESS_SUFFIX) {
            counts.in_progress += 1;
        } else if line.ends_with(COMPLETED_SUFFIX) {
            counts.completed += 1;
            if let Some(partition) = completed_partition(line) {
                counts.completed_partitions.push(partition);
            }
        }
    }
    counts
}

/// Extracts `(topic, partition)` from
/// `Reassignment of partition [topic,N] completed successfully`.
pub fn completed_partition(line: &str) -> Option<(String, PartitionIdx)> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^Reassignment of partition \[?(.+),(\d+)\]? completed successfully$")
            .expect("static pattern")
    });
    let captures = pattern.captures(line.trim())?;
    let partition = captures.get(2)?.as_str().parse().ok()?;
    Some((captures.get(1)?.as_str().to_string(), PartitionIdx(partition)))
}

pub fn is_started(stdout: &[String]) -> bool {
    count_containing(stdout, STARTED_MESSAGE) == 1
}

pub fn is_throttle_changed(stdout: &[String]) -> bool {
    count_containing(stdout, ALREADY_RUNNING_MESSAGE) == 1
}

fn count_containing(stdout: &[String], needle: &str) -> usize {
    stdout.iter().filter(|l| l.contains(needle)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        to_lines(text)
    }

    #[test]
    fn counts_verify_lines() {
        let out = lines(
            "Status of partition reassignment:\n\
             Reassignment of partition [T,0] completed successfully\n\
             Reassignment of partition [T,1] is still in progress\n\
             Reassignment of partition [T,2] completed successfully\n\
             Throttle was removed.\n",
        );
        let counts = parse_verify(&out);
        assert_eq!(1, counts.in_progress);
        assert_eq!(2, counts.completed);
        assert_eq!(
            vec![
                ("T".to_string(), PartitionIdx(0)),
                ("T".to_string(), PartitionIdx(2))
            ],
            counts.completed_partitions
        );
    }

    #[test]
    fn ignores_lines_without_prefix() {
        let out = lines(
            "ERROR: Assigned replicas (1,2) don't match the list of replicas for reassignment (3,4) for partition [T,0]\n\
             Reassignment of partition [T,0] failed\n\
             partition [T,1] is still in progress\n",
        );
        assert_eq!(VerifyCounts::default(), parse_verify(&out));
    }

    #[test]
    fn trims_before_matching() {
        let out = vec!["   Reassignment of partition [T,0] is still in progress   ".to_string()];
        assert_eq!(1, parse_verify(&out).in_progress);
    }

    #[test]
    fn topic_with_dots() {
        assert_eq!(
            Some(("a.b-c".to_string(), PartitionIdx(12))),
            completed_partition("Reassignment of partition [a.b-c,12] completed successfully")
        );
        assert_eq!(None, completed_partition("Reassignment of partition [T,0] failed"));
    }

    #[test]
    fn started_exactly_once() {
        let out = lines(
            "Current partition replica assignment\n\
             {\"version\":1,\"partitions\":[]}\n\
             Save this to use as the --reassignment-json-file option during rollback\n\
             Warning: You must run Verify periodically, until the reassignment completes, to ensure the throttle is removed.\n\
             The inter-broker throttle limit was set to 1000 B/s\n\
             Successfully started reassignment of partitions.\n",
        );
        assert!(is_started(&out));
        assert!(!is_throttle_changed(&out));

        let mut twice = out.clone();
        twice.push(STARTED_MESSAGE.to_string());
        assert!(!is_started(&twice));
        assert!(!is_started(&[]));
    }

    #[test]
    fn throttle_change_confirmation() {
        let out = lines(
            "There is an existing assignment running.\n\
             The inter-broker throttle limit was set to 2000 B/s\n",
        );
        assert!(is_throttle_changed(&out));
        assert!(!is_started(&out));
    }
}
