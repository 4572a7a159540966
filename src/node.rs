// thermonode - Adaptive publishing for battery-powered sensor nodes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Node application context
//!
//! This module provides the [`Node`] type, which owns one publish gate
//! per sensor, the interval controller, the one-shot timers and the
//! collaborator handles. It is the only place that calls out to the
//! radio, the driver or the display: the decision core returns values
//! and the node routes them.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::clock::Clock;
use crate::config::NodeConfig;
use crate::error::Result;
use crate::gate::{Decision, PublishGate};
use crate::interval::{IntervalController, ReconfigureCommand};
use crate::ports::{BatteryMonitor, DisplaySink, Publisher, SensorDriver};
use crate::sample::{topic_for, DeviceId, Reading, SampleValue, Timestamp};
use crate::scheduler::TimerQueue;
use crate::VERSION;

/// Work queued on the node's timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTask {
    /// End of the service window
    SwitchToNormalMode,
    /// Periodic battery voltage report
    BatteryReport,
}

/// Something the node did while running due timers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeEvent {
    /// Sensor polling changed
    Reconfigured(ReconfigureCommand),
    /// Battery voltage handed to the radio
    BatteryPublished(f32),
    /// Battery measurement failed, nothing sent
    BatteryUnavailable,
}

/// A battery-powered temperature node
pub struct Node<C, D, P, S, B> {
    config: NodeConfig,
    clock: C,
    driver: D,
    radio: P,
    display: S,
    battery: B,
    gates: HashMap<DeviceId, PublishGate>,
    last_seen: HashMap<DeviceId, Timestamp>,
    controller: IntervalController,
    timers: TimerQueue<NodeTask>,
    started: bool,
}

impl<C, D, P, S, B> Node<C, D, P, S, B>
where
    C: Clock,
    D: SensorDriver,
    P: Publisher,
    S: DisplaySink,
    B: BatteryMonitor,
{
    /// Create a node; the service window starts at the clock's current time
    pub fn new(
        config: NodeConfig,
        clock: C,
        driver: D,
        radio: P,
        display: S,
        battery: B,
    ) -> Result<Self> {
        config.validate()?;
        let controller = IntervalController::new(clock.now(), config.interval.clone());
        Ok(Self {
            config,
            clock,
            driver,
            radio,
            display,
            battery,
            gates: HashMap::new(),
            last_seen: HashMap::new(),
            controller,
            timers: TimerQueue::new(),
            started: false,
        })
    }

    /// Boot sequence: fast polling, timers, pairing request
    ///
    /// Calling it again has no effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        let now = self.clock.now();
        self.driver.apply(self.controller.initial_command());
        self.timers
            .schedule_at(self.controller.fire_deadline(), NodeTask::SwitchToNormalMode);
        self.timers
            .schedule_once(now, self.config.battery_interval_ms, NodeTask::BatteryReport);

        if let Err(e) = self.radio.pairing_request(&self.config.pairing_name, VERSION) {
            warn!("pairing request failed: {}", e);
        }
        info!(
            "node started at {}: fast polling {}ms until {}",
            now,
            self.config.interval.fast_interval_ms,
            self.controller.fire_deadline()
        );
    }

    /// Handle a completed measurement from the sensor driver
    pub fn on_sample(
        &mut self,
        device_id: DeviceId,
        sample: SampleValue,
        timestamp: Timestamp,
    ) -> Decision {
        if let Some(&previous) = self.last_seen.get(&device_id) {
            if timestamp < previous {
                warn!(
                    "sensor {} delivered sample at {} after {}",
                    device_id, timestamp, previous
                );
            }
        }
        self.last_seen.insert(device_id, timestamp);

        let gate_config = &self.config.gate;
        let gate = self
            .gates
            .entry(device_id)
            .or_insert_with(|| PublishGate::with_config(gate_config.clone()));

        let decision = gate.evaluate(sample, timestamp);
        self.display.show(gate.display_value());

        if let Decision::Publish { value, reason } = decision {
            let topic = topic_for(device_id);
            match self.radio.publish(&topic, value) {
                Ok(()) => info!("published {:.2} to {} ({:?})", value, topic, reason),
                Err(e) => warn!("dropped {:.2} for {}: {}", value, topic, e),
            }
        }
        decision
    }

    /// Handle a [`Reading`]
    pub fn on_reading(&mut self, reading: Reading) -> Decision {
        self.on_sample(reading.device_id, reading.value, reading.timestamp)
    }

    /// Run every timer due at the clock's current time
    pub fn run_due(&mut self) -> Vec<NodeEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();
        while let Some((deadline, task)) = self.timers.pop_due(now) {
            debug!("running {:?} due at {}", task, deadline);
            match task {
                NodeTask::SwitchToNormalMode => {
                    if let Some(command) = self.controller.tick(now) {
                        self.driver.apply(command);
                        events.push(NodeEvent::Reconfigured(command));
                    }
                }
                NodeTask::BatteryReport => {
                    events.push(self.report_battery());
                    self.reschedule_battery(deadline, now);
                }
            }
        }
        events
    }

    // Missed periods are skipped: at most one report per run.
    fn reschedule_battery(&mut self, deadline: Timestamp, now: Timestamp) {
        let interval = self.config.battery_interval_ms;
        let mut next = deadline.saturating_add(interval);
        if next <= now {
            next = now.saturating_add(interval);
        }
        if next <= now {
            warn!("battery timer reached the end of the clock, no further reports");
            return;
        }
        self.timers.schedule_at(next, NodeTask::BatteryReport);
    }

    fn report_battery(&mut self) -> NodeEvent {
        match self.battery.voltage() {
            Some(voltage) => {
                if let Err(e) = self.radio.publish_battery(voltage) {
                    warn!("dropped battery report {:.2}V: {}", voltage, e);
                }
                NodeEvent::BatteryPublished(voltage)
            }
            None => {
                debug!("battery voltage unavailable");
                NodeEvent::BatteryUnavailable
            }
        }
    }

    /// Publish gate for a sensor, once it has delivered a sample
    pub fn gate(&self, device_id: DeviceId) -> Option<&PublishGate> {
        self.gates.get(&device_id)
    }

    /// Sensors seen so far
    pub fn sensors(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.gates.keys().copied()
    }

    /// Deadline of the next pending timer
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Whether `start` has run
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Interval controller
    pub fn controller(&self) -> &IntervalController {
        &self.controller
    }

    /// Node configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Time source
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Sensor driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Radio
    pub fn radio(&self) -> &P {
        &self.radio
    }

    /// Mutable radio access
    pub fn radio_mut(&mut self) -> &mut P {
        &mut self.radio
    }

    /// Display
    pub fn display(&self) -> &S {
        &self.display
    }
}
