// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration for the scheduler's own tunables.
//!
//! `SchedulerSettings` covers only the engine constants in the external
//! interfaces (instrument amount, schedule-ahead horizon, default step
//! precision, beat amount). Song/pattern data is constructed in memory by
//! callers and is never loaded from this file.

pub mod watcher;

pub use watcher::{ConfigEvent, ConfigWatcher};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sequencer::scheduler::SchedulerConfig;

/// File-backed scheduler tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SchedulerSettings {
    /// Number of voice-queue slots (one per instrument/channel).
    #[serde(default = "default_instrument_amount")]
    pub instrument_amount: usize,
    /// Lookahead horizon in seconds.
    #[serde(default = "default_schedule_ahead_time")]
    pub schedule_ahead_time: f64,
    /// Default step resolution for newly constructed patterns.
    #[serde(default = "default_step_precision")]
    pub default_step_precision: usize,
    /// Beats per whole note used in pattern-duration calculations.
    #[serde(default = "default_beat_amount")]
    pub beat_amount: f64,
}

fn default_instrument_amount() -> usize {
    8
}
fn default_schedule_ahead_time() -> f64 {
    0.2
}
fn default_step_precision() -> usize {
    64
}
fn default_beat_amount() -> f64 {
    4.0
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            instrument_amount: default_instrument_amount(),
            schedule_ahead_time: default_schedule_ahead_time(),
            default_step_precision: default_step_precision(),
            beat_amount: default_beat_amount(),
        }
    }
}

impl SchedulerSettings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("Failed to parse TOML configuration")
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// Save settings to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = self.to_toml()?;
        fs::write(path.as_ref(), toml_str)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }
}

impl From<SchedulerSettings> for SchedulerConfig {
    fn from(settings: SchedulerSettings) -> Self {
        SchedulerConfig {
            instrument_amount: settings.instrument_amount,
            schedule_ahead_time: settings.schedule_ahead_time,
            step_precision: settings.default_step_precision,
            beat_amount: settings.beat_amount,
        }
    }
}
