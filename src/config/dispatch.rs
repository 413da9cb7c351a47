use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Rate;
use crate::Result;

/// Parameters of the rate-limited drain loop
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Maximum number of models drained per tick
    /// A positive integer or "unbounded"
    #[serde(default)]
    pub rate: Rate,

    /// Pause between drain ticks (unit: milliseconds)
    /// 0 means the loop only yields to the runtime between ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Buffer of the tick report broadcast channel
    /// Slow subscribers skip the oldest reports
    #[serde(default = "default_tick_report_capacity")]
    pub tick_report_capacity: usize,

    /// Drop registry entries of unreachable models whenever the loop goes idle
    #[serde(default = "default_prune_on_idle")]
    pub prune_on_idle: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            rate: Rate::default(),
            tick_interval_ms: default_tick_interval_ms(),
            tick_report_capacity: default_tick_report_capacity(),
            prune_on_idle: default_prune_on_idle(),
        }
    }
}

impl DispatchConfig {
    /// Validates dispatch configuration
    /// # Errors
    /// Returns `Error::InvalidConfig` when:
    /// - the tick report channel has no capacity
    /// - the tick interval exceeds one minute
    pub fn validate(&self) -> Result<()> {
        if self.tick_report_capacity == 0 {
            return Err(Error::InvalidConfig(
                "tick_report_capacity must be greater than 0".into(),
            ));
        }

        if self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(Error::InvalidConfig(format!(
                "tick_interval_ms {} exceeds the maximum of {}ms",
                self.tick_interval_ms, MAX_TICK_INTERVAL_MS
            )));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

const MAX_TICK_INTERVAL_MS: u64 = 60_000;

fn default_tick_interval_ms() -> u64 {
    0
}

fn default_tick_report_capacity() -> usize {
    64
}

fn default_prune_on_idle() -> bool {
    true
}
