use std::path::PathBuf;
use std::time::Duration;

use crate::model::Tick;

/// Runtime settings, read from `RESERVA_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Wall-clock period of one logical tick.
    pub tick: Duration,
    /// Stop the demo once the logical clock reaches this tick.
    pub run_until: Tick,
    pub metrics_port: Option<u16>,
    /// JSON scenario file; the built-in scenario runs when unset.
    pub scenario: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(1000),
            run_until: 100,
            metrics_port: None,
            scenario: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let tick_ms: u64 = get("RESERVA_TICK_MS")
            .and_then(|s| s.parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(defaults.tick.as_millis() as u64);
        let run_until: Tick = get("RESERVA_RUN_UNTIL")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.run_until);
        let metrics_port: Option<u16> = get("RESERVA_METRICS_PORT").and_then(|s| s.parse().ok());
        let scenario = get("RESERVA_SCENARIO")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            tick: Duration::from_millis(tick_ms),
            run_until,
            metrics_port,
            scenario,
        }
    }
}
