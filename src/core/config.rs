use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

pub const MAX_DELAY_MS: u64 = 200;
pub const MIN_POPULATION: usize = 10;

/// Tunables injected by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Pause after each animated step, in milliseconds.
    pub delay_ms: u64,

    // GA Specific
    pub population_size: usize,
    /// Generation cap for the goal-biased GA; post-solution budget for PureGA.
    pub generations: usize,
    pub mutation_rate: f64,
    pub goal_bias: f64,
    pub elitism_count: usize,
    pub seed: u64,

    // Cadence
    pub animate_every: usize,
    pub report_every: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            population_size: 60,
            generations: 500,
            mutation_rate: 0.05,
            goal_bias: 0.3,
            elitism_count: 4,
            seed: 42,
            animate_every: 5,
            report_every: 10,
        }
    }
}

impl SolverConfig {
    /// Reads a JSON config; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: SolverConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(cfg.normalized())
    }

    /// Clamps every field into its legal range.
    pub fn normalized(mut self) -> Self {
        if self.delay_ms > MAX_DELAY_MS {
            warn!("delay {}ms clamped to {}ms", self.delay_ms, MAX_DELAY_MS);
            self.delay_ms = MAX_DELAY_MS;
        }
        if self.population_size < MIN_POPULATION {
            warn!("population {} raised to {}", self.population_size, MIN_POPULATION);
            self.population_size = MIN_POPULATION;
        }
        self.elitism_count = self.elitism_count.clamp(1, self.population_size - 1);
        self.generations = self.generations.max(1);
        self.mutation_rate = clamp_rate(self.mutation_rate);
        self.goal_bias = clamp_rate(self.goal_bias);
        self.animate_every = self.animate_every.max(1);
        self.report_every = self.report_every.max(1);
        self
    }
}

fn clamp_rate(r: f64) -> f64 {
    if r.is_nan() { 0.0 } else { r.clamp(0.0, 1.0) }
}
