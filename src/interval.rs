// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dual-phase polling control
//!
//! After power-up the sensor is polled fast so the node can be checked
//! in place and show instant changes. Once the service window is over
//! the controller hands out a single command switching to the slow
//! interval, then stays inert for the rest of the process lifetime.
//!
//! ```text
//! Active --(now >= fire_deadline)--> Fired
//! ```

use log::info;

use crate::config::IntervalConfig;
use crate::sample::Timestamp;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalState {
    /// Service window still running
    #[default]
    Active,
    /// Slow interval handed out; terminal
    Fired,
}

/// Command for the sensor driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconfigureCommand {
    /// Poll the sensor every `n` milliseconds
    SetPollingInterval(u64),
}

/// One-shot switch from fast to slow polling
#[derive(Debug, Clone)]
pub struct IntervalController {
    config: IntervalConfig,
    state: IntervalState,
    fire_deadline: Timestamp,
}

impl IntervalController {
    /// Create a controller whose service window starts at `start`
    pub fn new(start: Timestamp, config: IntervalConfig) -> Self {
        let fire_deadline = start.saturating_add(config.service_window_ms);
        Self {
            config,
            state: IntervalState::Active,
            fire_deadline,
        }
    }

    /// Polling command to apply at boot
    pub fn initial_command(&self) -> ReconfigureCommand {
        ReconfigureCommand::SetPollingInterval(self.config.fast_interval_ms)
    }

    /// Advance to `now`, returning the slow-interval command exactly once
    pub fn tick(&mut self, now: Timestamp) -> Option<ReconfigureCommand> {
        match self.state {
            IntervalState::Fired => None,
            IntervalState::Active if now >= self.fire_deadline => {
                self.state = IntervalState::Fired;
                info!(
                    "service window over at {}, polling every {}ms",
                    now, self.config.slow_interval_ms
                );
                Some(ReconfigureCommand::SetPollingInterval(
                    self.config.slow_interval_ms,
                ))
            }
            IntervalState::Active => None,
        }
    }

    /// Current state
    pub fn state(&self) -> IntervalState {
        self.state
    }

    /// Check if the service window is still running
    pub fn is_active(&self) -> bool {
        self.state == IntervalState::Active
    }

    /// Tick at which the controller fires
    pub fn fire_deadline(&self) -> Timestamp {
        self.fire_deadline
    }

    /// Milliseconds left before firing; 0 once due or fired
    pub fn remaining(&self, now: Timestamp) -> u64 {
        match self.state {
            IntervalState::Fired => 0,
            IntervalState::Active => self.fire_deadline.saturating_sub(now),
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &IntervalConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(window: u64) -> IntervalController {
        IntervalController::new(
            0,
            IntervalConfig {
                service_window_ms: window,
                fast_interval_ms: 5_000,
                slow_interval_ms: 3_600_000,
            },
        )
    }

    #[test]
    fn test_fires_once_at_deadline() {
        let mut ctrl = controller(600_000);

        assert_eq!(ctrl.tick(599_999), None);
        assert!(ctrl.is_active());
        assert_eq!(
            ctrl.tick(600_000),
            Some(ReconfigureCommand::SetPollingInterval(3_600_000))
        );
        assert_eq!(ctrl.state(), IntervalState::Fired);
        assert_eq!(ctrl.tick(700_000), None);
    }

    #[test]
    fn test_late_tick_fires() {
        let mut ctrl = controller(1_000);
        assert!(ctrl.tick(50_000).is_some());
        assert!(ctrl.tick(50_000).is_none());
    }

    #[test]
    fn test_deadline_offset_by_start() {
        let ctrl = IntervalController::new(10_000, IntervalConfig::with_service_window(600_000));
        assert_eq!(ctrl.fire_deadline(), 610_000);
    }

    #[test]
    fn test_remaining() {
        let mut ctrl = controller(1_000);
        assert_eq!(ctrl.remaining(0), 1_000);
        assert_eq!(ctrl.remaining(400), 600);
        assert_eq!(ctrl.remaining(2_000), 0);
        ctrl.tick(1_000);
        assert_eq!(ctrl.remaining(0), 0);
    }

    #[test]
    fn test_initial_command_is_fast() {
        let ctrl = controller(1_000);
        assert_eq!(
            ctrl.initial_command(),
            ReconfigureCommand::SetPollingInterval(5_000)
        );
    }

    #[test]
    fn test_zero_window_fires_immediately() {
        let mut ctrl = controller(0);
        assert!(ctrl.tick(0).is_some());
    }

    #[test]
    fn test_deadline_saturates() {
        let ctrl = IntervalController::new(u64::MAX - 1, IntervalConfig::default());
        assert_eq!(ctrl.fire_deadline(), u64::MAX);
    }
}
