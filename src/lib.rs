// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # thermonode - Adaptive publishing for battery-powered sensor nodes
//!
//! Decision logic for a wireless temperature node that only spends radio
//! time on measurements worth sending.
//!
//! ## Key Features
//!
//! - **Hysteresis gate**: publish only when the value moved by a threshold
//! - **Liveness**: publish anyway once the silence deadline is reached
//! - **Dual-phase polling**: fast polling after boot, slow polling afterwards
//! - **No I/O in the core**: decisions are returned, the [`Node`] routes them
//!
//! ## Quick Start
//!
//! ```rust
//! use thermonode::{GateConfig, PublishGate, SampleValue};
//!
//! let mut gate = PublishGate::with_config(GateConfig::new(0.5, 300_000));
//!
//! assert!(gate.evaluate(SampleValue::new(20.0), 0).should_publish());
//! assert!(!gate.evaluate(SampleValue::new(20.3), 5_000).should_publish());
//! assert!(gate.evaluate(SampleValue::new(21.0), 10_000).should_publish());
//! ```
//!
//! ## Modules
//!
//! - [`gate`]: Publish decision per sensor
//! - [`interval`]: One-shot switch from fast to slow polling
//! - [`node`]: Application context wiring the core to its collaborators
//! - [`ports`]: Collaborator traits (driver, radio, display, battery)
//! - [`scheduler`]: Cooperative one-shot timers
//! - [`clock`]: Time sources
//! - [`config`]: Configuration and defaults

// Modules
pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod interval;
pub mod node;
pub mod ports;
pub mod sample;
pub mod scheduler;

// Re-exports for convenient access
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{GateConfig, IntervalConfig, NodeConfig};
pub use error::{ConfigError, NodeError, RadioError, Result};
pub use gate::{Decision, GateStats, PublishGate, PublishReason, PublishState};
pub use interval::{IntervalController, IntervalState, ReconfigureCommand};
pub use node::{Node, NodeEvent, NodeTask};
pub use ports::{
    BatteryMonitor, DisplaySink, FixedBattery, PublishedMessage, Publisher, RadioMetrics,
    RecordingDisplay, RecordingDriver, RecordingPublisher, SensorDriver,
};
pub use sample::{topic_for, DeviceId, Reading, SampleValue, Timestamp};
pub use scheduler::TimerQueue;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
