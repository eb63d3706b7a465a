//! Per-operation timeouts
//!
//! A resource declares its defaults; callers may override any of them for a
//! single invocation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Operation kinds that carry a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeouts {
    #[serde(with = "secs")]
    pub create: Duration,
    #[serde(with = "secs")]
    pub read: Duration,
    #[serde(with = "secs")]
    pub delete: Duration,
}

impl Timeouts {
    /// Same timeout for every operation.
    pub const fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            read: timeout,
            delete: timeout,
        }
    }

    pub fn get(&self, op: Operation) -> Duration {
        match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Delete => self.delete,
        }
    }

    /// Apply caller overrides on top of these defaults.
    pub fn with_overrides(mut self, overrides: &TimeoutOverrides) -> Self {
        if let Some(secs) = overrides.create {
            self.create = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.read {
            self.read = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.delete {
            self.delete = Duration::from_secs(secs);
        }
        self
    }
}

/// Optional per-operation overrides, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutOverrides {
    pub create: Option<u64>,
    pub read: Option<u64>,
    pub delete: Option<u64>,
}

mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
}
