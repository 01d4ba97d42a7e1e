//! Engine tuning knobs.

use std::time::Duration;

/// Limits and constants applied by the plan builder and swap engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on any single recipe service call.
    pub upstream_timeout: Duration,
    /// How long a stored plan stays readable.
    pub retention_days: i64,
    /// Number of candidates requested when swapping a slot.
    pub swap_batch_size: u32,
    /// Search offsets for swaps are drawn from `0..swap_offset_span`.
    pub swap_offset_span: u32,
}

impl EngineConfig {
    pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_RETENTION_DAYS: i64 = 90;
    pub const DEFAULT_SWAP_BATCH_SIZE: u32 = 5;
    pub const DEFAULT_SWAP_OFFSET_SPAN: u32 = 50;

    /// Override the upstream timeout.
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Retention as a chrono duration, for computing `expires_at`.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            upstream_timeout: Self::DEFAULT_UPSTREAM_TIMEOUT,
            retention_days: Self::DEFAULT_RETENTION_DAYS,
            swap_batch_size: Self::DEFAULT_SWAP_BATCH_SIZE,
            swap_offset_span: Self::DEFAULT_SWAP_OFFSET_SPAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(30));
        assert_eq!(cfg.retention(), chrono::Duration::days(90));
        assert_eq!(cfg.swap_batch_size, 5);
    }

    #[test]
    fn timeout_override() {
        let cfg = EngineConfig::default().with_upstream_timeout(Duration::from_millis(250));
        assert_eq!(cfg.upstream_timeout, Duration::from_millis(250));
    }
}
