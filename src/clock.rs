// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Time sources

use std::cell::Cell;
use std::time::Instant;

use crate::sample::Timestamp;

/// Monotonic millisecond clock
pub trait Clock {
    /// Milliseconds since the clock's epoch
    fn now(&self) -> Timestamp;
}

/// Clock backed by [`Instant`], with its epoch at construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Create a clock reading 0 now
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.epoch.elapsed().as_millis() as Timestamp
    }
}

/// Clock that only moves when told to
///
/// Setting it backwards is ignored so readings stay monotonic.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    /// Create a clock reading `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock to `t`
    pub fn set(&self, t: Timestamp) {
        if t > self.now.get() {
            self.now.set(t);
        }
    }

    /// Move the clock forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}
