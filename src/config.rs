//! Engine policy, built by the binary from its command-line arguments.

use crate::models::Metric;

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    /// Metric selected before the first snapshot arrives.
    pub default_metric: Metric,
    /// Treat a snapshot with no records as a failed fetch.
    pub require_non_empty: bool,
}

impl EngineConfig {
    pub fn new(default_metric: Metric) -> Self {
        Self {
            default_metric,
            ..Self::default()
        }
    }

    pub fn require_non_empty(mut self, value: bool) -> Self {
        self.require_non_empty = value;
        self
    }
}
