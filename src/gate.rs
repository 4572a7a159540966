// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Publish decision module
//!
//! This module decides, for each new sample of one sensor, whether the
//! value is worth a radio transmission. A sample is published when it
//! moved at least `change_threshold` away from the last published value,
//! or when the silence deadline has been reached. Both bounds are
//! inclusive.

use log::debug;

use crate::config::GateConfig;
use crate::sample::{SampleValue, Timestamp};

/// Outcome of evaluating one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Transmit this value
    Publish { value: f64, reason: PublishReason },
    /// Valid sample, not worth transmitting
    Skip { delta: f64 },
    /// Failed read, nothing decided
    Unavailable,
}

impl Decision {
    /// Check if this decision asks for a transmission
    pub fn should_publish(&self) -> bool {
        matches!(self, Decision::Publish { .. })
    }

    /// The value to transmit, if any
    pub fn published_value(&self) -> Option<f64> {
        match self {
            Decision::Publish { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Why a sample was published
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PublishReason {
    /// Nothing had been published yet
    FirstSample,
    /// Value moved at least the change threshold
    ValueChanged { delta: f64 },
    /// Silence deadline reached
    SilenceExpired { overdue_ms: u64 },
}

/// Bookkeeping for the last transmission
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PublishState {
    /// Last value handed to the radio
    pub last_published_value: SampleValue,
    /// Publishing is forced at or after this tick
    pub next_allowed_silence_deadline: Timestamp,
}

/// Counters kept by a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateStats {
    /// Samples evaluated, including failed reads
    pub evaluated: u64,
    /// Samples published
    pub published: u64,
    /// Valid samples withheld
    pub skipped: u64,
    /// Failed reads
    pub unavailable: u64,
}

/// Hysteresis gate for one sensor
#[derive(Debug, Clone)]
pub struct PublishGate {
    config: GateConfig,
    state: PublishState,
    display: SampleValue,
    stats: GateStats,
}

impl PublishGate {
    /// Create a gate with default configuration
    pub fn new() -> Self {
        Self::with_config(GateConfig::default())
    }

    /// Create a gate with custom configuration
    pub fn with_config(config: GateConfig) -> Self {
        Self {
            config,
            state: PublishState::default(),
            display: SampleValue::unavailable(),
            stats: GateStats::default(),
        }
    }

    /// Evaluate a new sample taken at `now`
    pub fn evaluate(&mut self, sample: SampleValue, now: Timestamp) -> Decision {
        self.stats.evaluated += 1;

        let value = match sample.value() {
            Some(v) => v,
            None => {
                if !self.config.hold_display_on_fault {
                    self.display = SampleValue::unavailable();
                }
                self.stats.unavailable += 1;
                debug!("sample unavailable at {}", now);
                return Decision::Unavailable;
            }
        };
        self.display = sample;

        let delta = match self.state.last_published_value.value() {
            Some(last) => (value - last).abs(),
            None => f64::INFINITY,
        };

        let reason = self.publish_reason(delta, now);
        match reason {
            Some(reason) => {
                self.state.last_published_value = sample;
                self.state.next_allowed_silence_deadline =
                    now.saturating_add(self.config.max_silence_ms);
                self.stats.published += 1;
                debug!("publish {:.2} at {} ({:?})", value, now, reason);
                Decision::Publish { value, reason }
            }
            None => {
                self.stats.skipped += 1;
                debug!("skip {:.2} at {} (delta {:.3})", value, now, delta);
                Decision::Skip { delta }
            }
        }
    }

    fn publish_reason(&self, delta: f64, now: Timestamp) -> Option<PublishReason> {
        if !self.state.last_published_value.is_valid() {
            return Some(PublishReason::FirstSample);
        }
        if delta >= self.config.change_threshold {
            return Some(PublishReason::ValueChanged { delta });
        }
        let deadline = self.state.next_allowed_silence_deadline;
        if now >= deadline {
            return Some(PublishReason::SilenceExpired {
                overdue_ms: now - deadline,
            });
        }
        None
    }

    /// Latest raw reading, independent of the publish decision
    pub fn display_value(&self) -> SampleValue {
        self.display
    }

    /// Current publish bookkeeping
    pub fn state(&self) -> &PublishState {
        &self.state
    }

    /// Decision counters
    pub fn stats(&self) -> GateStats {
        self.stats
    }

    /// Get current configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

impl Default for PublishGate {
    fn default() -> Self {
        Self::new()
    }
}
