//! Newtype wrappers for type safety

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier the companion assigns to a submitted build job
///
/// `TaskId::FAILED` is the sentinel for a submission the companion refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i32);

impl TaskId {
    /// Sentinel returned when the companion could not start the job
    pub const FAILED: Self = Self(-1);

    /// Create a task ID
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Whether this is the submission-failure sentinel
    #[must_use]
    pub const fn is_failed(self) -> bool {
        self.0 == Self::FAILED.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i32> for TaskId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}
