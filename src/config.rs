use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_threshold() -> u64 {
    100
}

fn default_window_secs() -> u64 {
    10
}

/// Engine configuration (§6).
///
/// Deserializable with per-field defaults so a host can load a partial
/// config file/env overlay and still get sane values for anything it
/// omits, the same shape as the teacher's `BenchmarkConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Per-window arrival count above which a key enters sampling.
    #[serde(default = "default_threshold")]
    pub threshold: u64,

    /// Nominal flush period, in seconds. The engine does not schedule
    /// itself; the host calls [`crate::Engine::flush`] on this cadence.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Reservoir length. Historically equal to `threshold` in the
    /// reference implementation; kept independent here (see
    /// `DESIGN.md`). `None` means "default to `threshold`".
    #[serde(default)]
    pub reservoir_size: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            window_secs: default_window_secs(),
            reservoir_size: None,
        }
    }
}

impl EngineConfig {
    /// Build a config from explicit values, validating as it goes.
    pub fn new(threshold: u64, window: Duration, reservoir_size: usize) -> Result<Self, ConfigError> {
        let cfg = Self {
            threshold,
            window_secs: window.as_secs(),
            reservoir_size: Some(reservoir_size),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// The nominal flush period as a [`Duration`].
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Effective reservoir length: the configured value, or `threshold`
    /// when unset.
    #[must_use]
    pub fn reservoir_size(&self) -> usize {
        self.reservoir_size.unwrap_or(self.threshold as usize)
    }

    /// Check the invariants `threshold >= 1` and `reservoir_size >= 1`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold < 1 {
            return Err(ConfigError::ThresholdTooSmall(self.threshold));
        }
        let reservoir_size = self.reservoir_size();
        if reservoir_size < 1 {
            return Err(ConfigError::ReservoirSizeTooSmall(reservoir_size));
        }
        Ok(())
    }
}
