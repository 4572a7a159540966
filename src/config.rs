// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Configuration types for thermonode
//!
//! Defaults match the stock firmware: fast 5 s polling for the first
//! 10 minutes after boot, 1 minute polling afterwards, a 0.5 °C change
//! threshold and a forced publish at least every 5 minutes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default minimum change that triggers a publish
pub const DEFAULT_CHANGE_THRESHOLD: f64 = 0.5;

/// Default longest silence before a publish is forced (5 minutes)
pub const DEFAULT_MAX_SILENCE_MS: u64 = 5 * 60 * 1000;

/// Default length of the fast-polling service window (10 minutes)
pub const DEFAULT_SERVICE_WINDOW_MS: u64 = 10 * 60 * 1000;

/// Default polling interval during the service window (5 seconds)
pub const DEFAULT_FAST_INTERVAL_MS: u64 = 5 * 1000;

/// Default polling interval after the service window (1 minute)
pub const DEFAULT_SLOW_INTERVAL_MS: u64 = 60 * 1000;

/// Default battery report period (30 minutes)
pub const DEFAULT_BATTERY_INTERVAL_MS: u64 = 30 * 60 * 1000;

/// Name announced in the pairing request
pub const DEFAULT_PAIRING_NAME: &str = "printer-temperature-monitor";

/// Publish gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum absolute change from the last published value (inclusive)
    pub change_threshold: f64,

    /// Longest allowed silence in milliseconds (inclusive)
    pub max_silence_ms: u64,

    /// Keep the previous display value when a read fails
    pub hold_display_on_fault: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            change_threshold: DEFAULT_CHANGE_THRESHOLD,
            max_silence_ms: DEFAULT_MAX_SILENCE_MS,
            hold_display_on_fault: false,
        }
    }
}

impl GateConfig {
    /// Create a configuration with explicit threshold and silence limit
    pub fn new(change_threshold: f64, max_silence_ms: u64) -> Self {
        Self {
            change_threshold,
            max_silence_ms,
            ..Default::default()
        }
    }

    /// Check the configuration for values the gate cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.change_threshold.is_finite() || self.change_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.change_threshold));
        }
        if self.max_silence_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                name: "max_silence_ms",
            });
        }
        Ok(())
    }
}

/// Dual-phase polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    /// Time after boot during which the fast interval applies
    pub service_window_ms: u64,

    /// Polling interval during the service window
    pub fast_interval_ms: u64,

    /// Polling interval once the service window is over
    pub slow_interval_ms: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            service_window_ms: DEFAULT_SERVICE_WINDOW_MS,
            fast_interval_ms: DEFAULT_FAST_INTERVAL_MS,
            slow_interval_ms: DEFAULT_SLOW_INTERVAL_MS,
        }
    }
}

impl IntervalConfig {
    /// Create a configuration with a custom service window
    pub fn with_service_window(service_window_ms: u64) -> Self {
        Self {
            service_window_ms,
            ..Default::default()
        }
    }

    /// Check the configuration for values the controller cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                name: "fast_interval_ms",
            });
        }
        if self.slow_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                name: "slow_interval_ms",
            });
        }
        if self.slow_interval_ms < self.fast_interval_ms {
            return Err(ConfigError::SlowFasterThanFast {
                slow_ms: self.slow_interval_ms,
                fast_ms: self.fast_interval_ms,
            });
        }
        Ok(())
    }
}

/// Node-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Publish gate settings, shared by every sensor
    pub gate: GateConfig,

    /// Polling phase settings
    pub interval: IntervalConfig,

    /// Battery report period in milliseconds
    pub battery_interval_ms: u64,

    /// Name sent with the pairing request
    pub pairing_name: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            interval: IntervalConfig::default(),
            battery_interval_ms: DEFAULT_BATTERY_INTERVAL_MS,
            pairing_name: DEFAULT_PAIRING_NAME.to_string(),
        }
    }
}

impl NodeConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gate.validate()?;
        self.interval.validate()?;
        if self.battery_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                name: "battery_interval_ms",
            });
        }
        Ok(())
    }
}
