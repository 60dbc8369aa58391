//! Configuration recognized by the core (spec.md §6). `ConfigurationError`
//! rejection is left to the CLI collaborator (spec.md §7); the core only
//! exposes [`Config::validate`] for that collaborator to call.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub const MAX_WORKER_COUNT: usize = 16;
pub const MAX_RECURSE_LINKS: u8 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of indexer worker threads, in `[1, 16]`.
    pub worker_count: usize,
    /// File extensions (without the leading dot) considered for file
    /// sources.
    pub extensions: HashSet<String>,
    /// Web source recursion depth, in `[0, 8]`.
    pub recurse_links: u8,
    /// Maximum number of documents merged per writer transaction.
    pub batch_cap: usize,
    /// Word-hash cache size before flush (spec.md §4.2/§9 design note 1).
    pub hash_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        let worker_count = num_cpus::get().clamp(1, MAX_WORKER_COUNT);
        let extensions = ["txt", "md", "rs", "py", "html", "c", "cpp", "h", "java"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Config {
            worker_count,
            extensions,
            recurse_links: 0,
            batch_cap: 10_000,
            hash_cache_capacity: 500_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, snafu::Snafu)]
pub enum ConfigError {
    #[snafu(display("worker_count must be in [1, {MAX_WORKER_COUNT}], got {value}"))]
    WorkerCount { value: usize },
    #[snafu(display("recurse_links must be in [0, {MAX_RECURSE_LINKS}], got {value}"))]
    RecurseLinks { value: u8 },
    #[snafu(display("batch_cap must be at least 1, got {value}"))]
    BatchCap { value: usize },
}

impl Config {
    /// Validate a caller-provided configuration. The core itself never
    /// calls this -- only the external CLI/config loader is expected to,
    /// before handing a `Config` to the dispatcher (spec.md §7).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 || self.worker_count > MAX_WORKER_COUNT {
            return Err(ConfigError::WorkerCount {
                value: self.worker_count,
            });
        }
        if self.recurse_links > MAX_RECURSE_LINKS {
            return Err(ConfigError::RecurseLinks {
                value: self.recurse_links,
            });
        }
        if self.batch_cap == 0 {
            return Err(ConfigError::BatchCap {
                value: self.batch_cap,
            });
        }
        Ok(())
    }
}
