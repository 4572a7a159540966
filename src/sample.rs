// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sample definitions
//!
//! This module defines the values exchanged between the sensor driver,
//! the decision core and the radio:
//! - Timestamps and device identifiers
//! - Sample values with a validity flag
//! - Topic derivation for published temperatures

use std::fmt;

/// Monotonic time in milliseconds since an arbitrary epoch
pub type Timestamp = u64;

/// Stable per-sensor identifier (the sensor's bus address)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceId(pub u64);

impl DeviceId {
    /// Create a device identifier from its raw address
    pub fn new(address: u64) -> Self {
        Self(address)
    }

    /// Parse a hexadecimal address, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(digits, 16).ok().map(Self)
    }

    /// Raw address
    pub fn address(&self) -> u64 {
        self.0
    }
}

impl fmt::LowerHex for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Topic a device's temperature is published under
pub fn topic_for(device_id: DeviceId) -> String {
    format!("thermometer/{:x}/temperature", device_id)
}

/// A measurement, or the absence of one after a failed read
///
/// Non-finite inputs (NaN, infinities) are folded into the
/// unavailable state at construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleValue(Option<f64>);

impl SampleValue {
    /// Create a sample; non-finite values become unavailable
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(Some(value))
        } else {
            Self(None)
        }
    }

    /// Marker for a failed read
    pub fn unavailable() -> Self {
        Self(None)
    }

    /// The measured value, if the read succeeded
    pub fn value(&self) -> Option<f64> {
        self.0
    }

    /// Check whether this sample carries a value
    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }
}

impl From<f64> for SampleValue {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Option<f64>> for SampleValue {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::new).unwrap_or_default()
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.2}", v),
            None => write!(f, "unavailable"),
        }
    }
}

/// A completed measurement as delivered by the sensor driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Sensor that produced the measurement
    pub device_id: DeviceId,
    /// The measured value
    pub value: SampleValue,
    /// When the measurement completed
    pub timestamp: Timestamp,
}

impl Reading {
    /// Create a new reading
    pub fn new(device_id: DeviceId, value: impl Into<SampleValue>, timestamp: Timestamp) -> Self {
        Self {
            device_id,
            value: value.into(),
            timestamp,
        }
    }
}
