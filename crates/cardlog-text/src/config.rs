//! Resolver limits.

use std::time::Duration;

use cardlog_core::defaults;

/// Bounds applied to every top-level resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum nesting depth of note lookups.
    pub max_depth: usize,
    /// Maximum number of notes entered by one top-level call.
    pub max_steps: usize,
    /// Wall-clock limit for one top-level call. `None` disables it.
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: defaults::RESOLVE_MAX_DEPTH,
            max_steps: defaults::RESOLVE_MAX_STEPS,
            timeout: Some(Duration::from_millis(defaults::RESOLVE_TIMEOUT_MS)),
        }
    }
}

impl ResolverConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CARDLOG_RESOLVE_MAX_DEPTH` | `32` | Maximum nesting depth |
    /// | `CARDLOG_RESOLVE_MAX_STEPS` | `2048` | Notes entered per call |
    /// | `CARDLOG_RESOLVE_TIMEOUT_MS` | `5000` | Per-call timeout, `0` disables |
    pub fn from_env() -> Self {
        let max_depth = std::env::var("CARDLOG_RESOLVE_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::RESOLVE_MAX_DEPTH)
            .max(1);

        let max_steps = std::env::var("CARDLOG_RESOLVE_MAX_STEPS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::RESOLVE_MAX_STEPS)
            .max(1);

        let timeout_ms = std::env::var("CARDLOG_RESOLVE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::RESOLVE_TIMEOUT_MS);

        Self {
            max_depth,
            max_steps,
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
