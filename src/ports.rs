// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Collaborator interfaces
//!
//! The node talks to hardware only through these traits: the sensor
//! driver, the radio, the display and the battery monitor. Recording
//! implementations are provided for tests and for the host simulator.

use crate::error::RadioError;
use crate::interval::ReconfigureCommand;
use crate::sample::SampleValue;

/// Temperature sensor driver
pub trait SensorDriver {
    /// Change how often the sensor is measured
    fn set_polling_interval(&mut self, interval_ms: u64);

    /// Apply a command from the interval controller
    fn apply(&mut self, command: ReconfigureCommand) {
        match command {
            ReconfigureCommand::SetPollingInterval(ms) => self.set_polling_interval(ms),
        }
    }
}

/// Wireless link to the gateway
///
/// Sends are fire-and-forget: callers log failures and move on.
pub trait Publisher {
    /// Publish a float under `topic`
    fn publish(&mut self, topic: &str, value: f64) -> Result<(), RadioError>;

    /// Publish the battery voltage
    fn publish_battery(&mut self, voltage: f32) -> Result<(), RadioError>;

    /// Ask the gateway to pair with this node
    fn pairing_request(&mut self, name: &str, version: &str) -> Result<(), RadioError>;
}

/// Local display
pub trait DisplaySink {
    /// Show the latest raw reading, or that none is available
    fn show(&mut self, value: SampleValue);
}

/// Battery voltage source
pub trait BatteryMonitor {
    /// Current voltage, `None` if the measurement failed
    fn voltage(&mut self) -> Option<f32>;
}

/// A message handed to the radio
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    /// Topic the value was published under
    pub topic: String,
    /// Published value
    pub value: f64,
}

/// Statistics about radio usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadioMetrics {
    /// Sends accepted
    pub sent: u64,
    /// Sends rejected
    pub failed: u64,
}

/// In-memory radio that records everything it is asked to send
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    messages: Vec<PublishedMessage>,
    battery: Vec<f32>,
    pairings: Vec<(String, String)>,
    failure: Option<RadioError>,
    metrics: RadioMetrics,
}

impl RecordingPublisher {
    /// Create a working radio
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a radio that rejects every send with `error`
    pub fn failing(error: RadioError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Temperature messages sent so far
    pub fn messages(&self) -> &[PublishedMessage] {
        &self.messages
    }

    /// Battery voltages sent so far
    pub fn battery_reports(&self) -> &[f32] {
        &self.battery
    }

    /// Pairing requests sent so far, as `(name, version)`
    pub fn pairings(&self) -> &[(String, String)] {
        &self.pairings
    }

    /// Get radio metrics
    pub fn metrics(&self) -> RadioMetrics {
        self.metrics
    }

    /// Make subsequent sends succeed again
    pub fn recover(&mut self) {
        self.failure = None;
    }

    fn check(&mut self) -> Result<(), RadioError> {
        match &self.failure {
            Some(err) => {
                self.metrics.failed += 1;
                Err(err.clone())
            }
            None => {
                self.metrics.sent += 1;
                Ok(())
            }
        }
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, value: f64) -> Result<(), RadioError> {
        self.check()?;
        self.messages.push(PublishedMessage {
            topic: topic.to_string(),
            value,
        });
        Ok(())
    }

    fn publish_battery(&mut self, voltage: f32) -> Result<(), RadioError> {
        self.check()?;
        self.battery.push(voltage);
        Ok(())
    }

    fn pairing_request(&mut self, name: &str, version: &str) -> Result<(), RadioError> {
        self.check()?;
        self.pairings.push((name.to_string(), version.to_string()));
        Ok(())
    }
}

/// Sensor driver that records polling changes
#[derive(Debug, Default)]
pub struct RecordingDriver {
    intervals: Vec<u64>,
}

impl RecordingDriver {
    /// Create a driver with no interval set
    pub fn new() -> Self {
        Self::default()
    }

    /// Every interval applied, oldest first
    pub fn intervals(&self) -> &[u64] {
        &self.intervals
    }

    /// Interval currently in force
    pub fn current_interval(&self) -> Option<u64> {
        self.intervals.last().copied()
    }
}

impl SensorDriver for RecordingDriver {
    fn set_polling_interval(&mut self, interval_ms: u64) {
        self.intervals.push(interval_ms);
    }
}

/// Display that keeps the last value shown
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    current: SampleValue,
    updates: u64,
}

impl RecordingDisplay {
    /// Create a blank display
    pub fn new() -> Self {
        Self::default()
    }

    /// Value currently shown
    pub fn current(&self) -> SampleValue {
        self.current
    }

    /// Number of refreshes
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl DisplaySink for RecordingDisplay {
    fn show(&mut self, value: SampleValue) {
        self.current = value;
        self.updates += 1;
    }
}

/// Battery monitor returning a fixed reading
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedBattery(pub Option<f32>);

impl BatteryMonitor for FixedBattery {
    fn voltage(&mut self) -> Option<f32> {
        self.0
    }
}
