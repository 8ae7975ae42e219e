use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::mover::output::{ALREADY_RUNNING_MESSAGE, STARTED_MESSAGE};
use crate::mover::{Mover, ToolOutput, VerifyReport};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
    Verify,
    Execute(u64),
}

/// Replays canned tool responses in order and records every call.
#[derive(Debug, Default)]
pub(crate) struct ScriptedMover {
    verifies: Mutex<VecDeque<Result<VerifyReport>>>,
    executes: Mutex<VecDeque<Result<ToolOutput>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedMover {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn verify_with(self, in_progress: usize, completed: usize) -> Self {
        self.verify_result(Ok(VerifyReport {
            in_progress,
            completed,
            completed_partitions: vec![],
            output: ToolOutput {
                stdout: vec![format!("{} in progress, {} completed", in_progress, completed)],
                stderr: vec![],
            },
        }))
    }

    pub(crate) fn verify_result(self, res: Result<VerifyReport>) -> Self {
        self.verifies.lock().unwrap().push_back(res);
        self
    }

    pub(crate) fn execute_with(self, stdout: &[&str]) -> Self {
        self.execute_result(Ok(ToolOutput {
            stdout: stdout.iter().map(|x| x.to_string()).collect(),
            stderr: vec![],
        }))
    }

    pub(crate) fn started(self) -> Self {
        self.execute_with(&["The inter-broker throttle limit was set", STARTED_MESSAGE])
    }

    pub(crate) fn throttled(self) -> Self {
        self.execute_with(&[ALREADY_RUNNING_MESSAGE])
    }

    pub(crate) fn execute_result(self, res: Result<ToolOutput>) -> Self {
        self.executes.lock().unwrap().push_back(res);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn throttles(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Execute(t) => Some(t),
                Call::Verify => None,
            })
            .collect()
    }
}

#[async_trait]
impl Mover for ScriptedMover {
    async fn verify(&self, assignment: &Path) -> Result<VerifyReport> {
        assert!(assignment.exists(), "assignment file must exist while in use");
        self.calls.lock().unwrap().push(Call::Verify);
        self.verifies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected verify call")
    }

    async fn execute(&self, assignment: &Path, throttle: u64) -> Result<ToolOutput> {
        assert!(assignment.exists(), "assignment file must exist while in use");
        self.calls.lock().unwrap().push(Call::Execute(throttle));
        self.executes
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected execute call")
    }
}
