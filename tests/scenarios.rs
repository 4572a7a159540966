// thermonode - Integration Tests
//
// Publish gate and interval controller behavior, end to end:
// 1. Reference scenarios
// 2. Invariants over random sample sequences
// 3. Full node lifecycle

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thermonode::*;

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn scenario_threshold_hysteresis() {
    let mut gate = PublishGate::with_config(GateConfig::new(0.5, 300_000));

    let decisions: Vec<bool> = [(20.0, 0), (20.3, 1_000), (21.0, 2_000)]
        .iter()
        .map(|&(v, t)| gate.evaluate(SampleValue::new(v), t).should_publish())
        .collect();

    assert_eq!(decisions, vec![true, false, true]);
    assert_eq!(gate.state().last_published_value, SampleValue::new(21.0));
}

#[test]
fn scenario_silence_deadline_equality() {
    let mut gate = PublishGate::with_config(GateConfig::new(0.5, 300_000));

    assert!(gate.evaluate(SampleValue::new(20.0), 0).should_publish());
    assert!(gate.evaluate(SampleValue::new(20.0), 300_000).should_publish());
    assert_eq!(gate.state().next_allowed_silence_deadline, 600_000);
}

#[test]
fn scenario_service_window() {
    let config = IntervalConfig {
        service_window_ms: 600_000,
        fast_interval_ms: 5_000,
        slow_interval_ms: 3_600_000,
    };
    let mut controller = IntervalController::new(0, config);

    assert_eq!(controller.tick(599_999), None);
    assert_eq!(
        controller.tick(600_000),
        Some(ReconfigureCommand::SetPollingInterval(3_600_000))
    );
    assert_eq!(controller.tick(700_000), None);
}

// ============================================================================
// Invariants
// ============================================================================

fn random_samples(seed: u64, count: usize) -> Vec<(SampleValue, Timestamp)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut t = 0u64;
    let mut value = 20.0f64;
    (0..count)
        .map(|_| {
            t += rng.gen_range(0..120_000);
            value += rng.gen_range(-0.6..0.6);
            let sample = if rng.gen_bool(0.1) {
                SampleValue::unavailable()
            } else {
                SampleValue::new(value)
            };
            (sample, t)
        })
        .collect()
}

#[test]
fn first_valid_sample_always_publishes() {
    for seed in 0..20 {
        let mut gate = PublishGate::new();
        for (sample, t) in random_samples(seed, 50) {
            let decision = gate.evaluate(sample, t);
            if sample.is_valid() {
                assert!(decision.should_publish(), "seed {}", seed);
                break;
            }
        }
    }
}

#[test]
fn state_changes_only_on_publish() {
    let config = GateConfig::new(0.5, 300_000);
    for seed in 0..20 {
        let mut gate = PublishGate::with_config(config.clone());
        for (sample, t) in random_samples(seed, 500) {
            let before = *gate.state();
            let decision = gate.evaluate(sample, t);
            let after = *gate.state();

            match decision {
                Decision::Publish { value, .. } => {
                    assert_eq!(after.last_published_value, SampleValue::new(value));
                    assert_eq!(after.next_allowed_silence_deadline, t + 300_000);
                }
                Decision::Skip { delta } => {
                    assert!(delta < 0.5);
                    assert!(t < before.next_allowed_silence_deadline);
                    assert_eq!(after, before);
                }
                Decision::Unavailable => {
                    assert!(!sample.is_valid());
                    assert_eq!(after, before);
                }
            }
        }
    }
}

#[test]
fn silence_never_exceeds_limit() {
    let mut gate = PublishGate::with_config(GateConfig::new(10.0, 60_000));
    let mut last_publish = None;

    for i in 0..1_000u64 {
        let t = i * 7_000;
        if gate.evaluate(SampleValue::new(20.0), t).should_publish() {
            if let Some(prev) = last_publish {
                assert!(t - prev <= 60_000 + 7_000);
            }
            last_publish = Some(t);
        }
    }
}

#[test]
fn controller_fires_exactly_once() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut controller = IntervalController::new(0, IntervalConfig::default());
    let mut t = 0u64;
    let mut fired_at = Vec::new();

    for _ in 0..1_000 {
        t += rng.gen_range(0..5_000);
        if controller.tick(t).is_some() {
            fired_at.push(t);
        }
    }

    assert_eq!(fired_at.len(), 1);
    assert!(fired_at[0] >= controller.fire_deadline());
}

// ============================================================================
// Node lifecycle
// ============================================================================

#[test]
fn node_lifecycle() {
    let mut node = Node::new(
        NodeConfig::default(),
        ManualClock::new(0),
        RecordingDriver::new(),
        RecordingPublisher::new(),
        RecordingDisplay::new(),
        FixedBattery(Some(2.9)),
    )
    .unwrap();
    node.start();

    let id = DeviceId::new(0x28ff_0000_0000_0001);
    let mut published = 0;

    // One hour of readings: 5 s polling, then 60 s once the window closes.
    let mut t = 0;
    while t <= 3_600_000 {
        node.clock().set(t);
        node.run_due();
        if node.on_sample(id, SampleValue::new(21.0), t).should_publish() {
            published += 1;
        }
        t += node.driver().current_interval().unwrap();
    }

    assert_eq!(node.driver().intervals(), &[5_000, 60_000]);
    // Constant value: first sample plus one forced publish per 5 minutes.
    assert_eq!(published, 13);
    assert_eq!(node.radio().battery_reports(), &[2.9, 2.9]);
    assert!(node
        .radio()
        .messages()
        .iter()
        .all(|m| m.topic == "thermometer/28ff000000000001/temperature"));
}
