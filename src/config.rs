use crate::partition::Partitioning;
use crate::PregelError;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the default worker thread count.
pub const MAX_THREADS_ENV: &str = "PREGEL_MAX_THREADS";

pub const DEFAULT_MAX_SUPERSTEPS: usize = 20;
pub const DEFAULT_PARTITION_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PregelConfig {
    /// Number of worker threads.
    pub concurrency: usize,
    /// Hard cap on executed supersteps.
    pub max_supersteps: usize,
    /// Largest node range the work-stealing strategy processes without splitting.
    pub partition_threshold: usize,
    pub partitioning: Partitioning,
}

impl Default for PregelConfig {
    fn default() -> Self {
        PregelConfig {
            concurrency: default_concurrency(),
            max_supersteps: DEFAULT_MAX_SUPERSTEPS,
            partition_threshold: DEFAULT_PARTITION_THRESHOLD,
            partitioning: Partitioning::Range,
        }
    }
}

impl PregelConfig {
    pub fn set_concurrency(&mut self, concurrency: usize) -> &mut Self {
        self.concurrency = concurrency;
        self
    }

    pub fn set_max_supersteps(&mut self, max_supersteps: usize) -> &mut Self {
        self.max_supersteps = max_supersteps;
        self
    }

    pub fn set_partition_threshold(&mut self, partition_threshold: usize) -> &mut Self {
        self.partition_threshold = partition_threshold;
        self
    }

    pub fn set_partitioning(&mut self, partitioning: Partitioning) -> &mut Self {
        self.partitioning = partitioning;
        self
    }

    pub fn validate(&self) -> Result<(), PregelError> {
        let positive = [
            ("concurrency", self.concurrency),
            ("max_supersteps", self.max_supersteps),
            ("partition_threshold", self.partition_threshold),
        ];

        for (field, value) in positive {
            if value == 0 {
                return Err(PregelError::InvalidConfig {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn default_concurrency() -> usize {
    std::env::var(MAX_THREADS_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
}
