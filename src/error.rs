// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for thermonode
//!
//! The decision core never fails. Errors only come from configuration
//! and from the radio collaborator, whose failures the node swallows.

use thiserror::Error;

/// Result type alias for thermonode operations
pub type Result<T> = std::result::Result<T, NodeError>;

/// Main error type for node operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Radio error
    #[error("Radio error: {0}")]
    Radio(#[from] RadioError),
}

/// Errors found while validating or loading a configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Change threshold is negative, NaN or infinite
    #[error("Invalid change threshold: {0}")]
    InvalidThreshold(f64),

    /// A duration that must be positive is zero
    #[error("Duration '{name}' must be greater than zero")]
    ZeroDuration { name: &'static str },

    /// Slow polling would be faster than the service-window polling
    #[error("Slow interval {slow_ms}ms is shorter than fast interval {fast_ms}ms")]
    SlowFasterThanFast { slow_ms: u64, fast_ms: u64 },

    /// The configuration document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configuration file could not be read
    #[error("Cannot read '{path}': {reason}")]
    Io { path: String, reason: String },
}

/// Errors reported by a radio implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RadioError {
    /// No gateway paired yet
    #[error("Radio not paired")]
    NotPaired,

    /// Transmission failed
    #[error("Transmission error after {retries} retries")]
    Transmission { retries: u8 },

    /// Send queue is full
    #[error("Send buffer full")]
    BufferFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NodeError::Config(ConfigError::SlowFasterThanFast {
            slow_ms: 1000,
            fast_ms: 5000,
        });
        let msg = format!("{}", err);
        assert!(msg.contains("Slow interval"));
        assert!(msg.contains("5000"));
    }

    #[test]
    fn test_error_conversion() {
        let radio_err = RadioError::Transmission { retries: 3 };
        let node_err: NodeError = radio_err.into();
        assert!(matches!(node_err, NodeError::Radio(_)));
    }
}
