use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ReassignError, Result};

/// Replication byte rates to apply over the life of one batch. The last value
/// repeats once the schedule runs out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct ThrottleSchedule(Vec<u64>);

impl ThrottleSchedule {
    pub fn new(rates: Vec<u64>) -> Result<Self> {
        if rates.is_empty() {
            return Err(ReassignError::invalid_throttle("throttle schedule is empty"));
        }
        Ok(Self(rates))
    }

    pub fn at(&self, i: usize) -> u64 {
        match self.0.get(i) {
            Some(rate) => *rate,
            None => self.last(),
        }
    }

    pub fn first(&self) -> u64 {
        self.0[0]
    }

    pub fn last(&self) -> u64 {
        self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Poll count after which the throttle is no longer changed.
    pub fn escalation_limit(&self) -> usize {
        2 * self.0.len()
    }
}

impl TryFrom<Vec<u64>> for ThrottleSchedule {
    type Error = ReassignError;

    fn try_from(rates: Vec<u64>) -> Result<Self> {
        Self::new(rates)
    }
}

impl From<ThrottleSchedule> for Vec<u64> {
    fn from(schedule: ThrottleSchedule) -> Self {
        schedule.0
    }
}

impl FromStr for ThrottleSchedule {
    type Err = ReassignError;

    /// Accepts `10,20,30` as well as `[10,20,30]`.
    fn from_str(s: &str) -> Result<Self> {
        let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
        let rates = inner
            .split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .map(|x| {
                x.parse::<u64>()
                    .map_err(|e| ReassignError::invalid_throttle(format!("{:?}: {}", x, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(rates)
    }
}

impl Display for ThrottleSchedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Supplies the schedule the driver should use for the next batch.
pub trait Throttle {
    fn current_schedule(&self) -> Result<ThrottleSchedule>;
}

#[derive(Clone, Debug)]
pub enum ThrottleSource {
    Explicit(ThrottleSchedule),
    /// JSON array of integers, re-read on every call.
    FileBacked(PathBuf),
}

impl ThrottleSource {
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        ThrottleSource::FileBacked(path.as_ref().to_path_buf())
    }
}

impl Throttle for ThrottleSource {
    fn current_schedule(&self) -> Result<ThrottleSchedule> {
        match self {
            ThrottleSource::Explicit(schedule) => Ok(schedule.clone()),
            ThrottleSource::FileBacked(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| ReassignError::Config {
                    file_path: path.display().to_string(),
                    error_msg: e.to_string(),
                })?;
                let schedule: ThrottleSchedule = serde_json::from_str(&contents)?;
                tracing::debug!(path = %path.display(), %schedule, "loaded throttle schedule");
                Ok(schedule)
            }
        }
    }
}
