use serde::{Deserialize, Serialize};

/// Number of leaves the adaptive splitter aims for per worker.
const LEAVES_PER_WORKER: usize = 4;

/// Settings for parallel evaluation.
///
/// Carried by every stream handle created from the same environment. Sequential
/// evaluation ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Worker threads started for one parallel evaluation.
    pub parallelism: usize,
    /// Sources larger than this are split further. `None` derives a threshold
    /// from the source size and `parallelism`.
    pub min_partition_len: Option<usize>,
    /// Upper bound on split recursion depth.
    pub max_split_depth: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            min_partition_len: None,
            max_split_depth: 16,
        }
    }
}

impl ExecutionConfig {
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_min_partition_len(mut self, len: usize) -> Self {
        self.min_partition_len = Some(len.max(1));
        self
    }

    pub fn with_max_split_depth(mut self, depth: usize) -> Self {
        self.max_split_depth = depth;
        self
    }

    /// Partition size above which a source of `len` elements keeps splitting.
    ///
    /// The adaptive threshold is `ceil(len / (4 * parallelism))`, never below 1.
    pub fn split_threshold(&self, len: usize) -> usize {
        match self.min_partition_len {
            Some(n) => n.max(1),
            None => {
                let leaves = self.parallelism.max(1) * LEAVES_PER_WORKER;
                len.div_ceil(leaves).max(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parallelism_positive() {
        let config = ExecutionConfig::default();
        assert!(config.parallelism >= 1);
        assert_eq!(config.min_partition_len, None);
    }

    #[test]
    fn test_adaptive_threshold() {
        let config = ExecutionConfig::default().with_parallelism(4);
        assert_eq!(config.split_threshold(1600), 100);
        assert_eq!(config.split_threshold(17), 2);
        assert_eq!(config.split_threshold(3), 1);
        assert_eq!(config.split_threshold(0), 1);
    }

    #[test]
    fn test_explicit_threshold_wins() {
        let config = ExecutionConfig::default()
            .with_parallelism(8)
            .with_min_partition_len(50);
        assert_eq!(config.split_threshold(10_000), 50);
    }

    #[test]
    fn test_zero_values_clamped() {
        let config = ExecutionConfig::default()
            .with_parallelism(0)
            .with_min_partition_len(0);
        assert_eq!(config.parallelism, 1);
        assert_eq!(config.split_threshold(10), 1);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = ExecutionConfig::default()
            .with_parallelism(6)
            .with_min_partition_len(128)
            .with_max_split_depth(4);
        let bytes = bincode::serialize(&config).unwrap();
        let restored: ExecutionConfig = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, config);
    }
}
