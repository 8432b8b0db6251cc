use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use hive_core::EcsConfig;
use serde::{Deserialize, Serialize};

/// Everything the runtime binary reads from its JSON settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub ecs: EcsConfig,
    /// Simulation ticks to run.
    pub ticks: u64,
    /// Simulated seconds per tick.
    pub dt: f32,
    /// Population the spawner keeps topping up to.
    pub entities: usize,
    /// Lifetime range of spawned entities, in seconds.
    pub min_lifetime: f32,
    pub max_lifetime: f32,
    /// Wall-clock period of the statistics reporter.
    pub report_every_ms: u64,
    /// Seed of the spawner's ChaCha stream.
    pub seed: u64,
}

impl RuntimeSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        let settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings in {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.dt.is_finite() && self.dt > 0.0, "dt must be positive, got {}", self.dt);
        ensure!(
            self.min_lifetime > 0.0 && self.min_lifetime <= self.max_lifetime,
            "lifetime range {}..{} is empty",
            self.min_lifetime,
            self.max_lifetime
        );
        ensure!(self.report_every_ms > 0, "report_every_ms must be positive");
        Ok(())
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_every_ms)
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            ecs: EcsConfig::default(),
            ticks: 600,
            dt: 1.0 / 60.0,
            entities: 1_000,
            min_lifetime: 0.5,
            max_lifetime: 4.0,
            report_every_ms: 250,
            seed: 0x5eed,
        }
    }
}
