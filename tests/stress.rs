//! Stress tests for thermonode
//!
//! Run with: cargo test --release stress -- --ignored

use std::time::Instant;
use thermonode::*;

#[test]
#[ignore] // Run manually with --ignored
fn stress_test_gate() {
    let mut gate = PublishGate::new();

    let iterations = 1_000_000u64;
    let start = Instant::now();
    let mut published = 0u64;

    for i in 0..iterations {
        let value = 20.0 + (i as f64 * 0.001).sin() * 3.0;
        if gate.evaluate(SampleValue::new(value), i * 1_000).should_publish() {
            published += 1;
        }
    }

    let elapsed = start.elapsed();
    let rate = iterations as f64 / elapsed.as_secs_f64();

    println!("Evaluated {} samples in {:?}", iterations, elapsed);
    println!("Published: {}", published);
    println!("Rate: {:.0} samples/second", rate);

    assert_eq!(gate.stats().published, published);
    assert!(
        rate > 1_000_000.0,
        "Should evaluate at least 1M samples/s, got {:.0}",
        rate
    );
}

#[test]
#[ignore]
fn stress_test_many_sensors() {
    let mut node = Node::new(
        NodeConfig::default(),
        ManualClock::new(0),
        RecordingDriver::new(),
        RecordingPublisher::new(),
        RecordingDisplay::new(),
        FixedBattery(Some(3.0)),
    )
    .unwrap();
    node.start();

    let sensors = 64u64;
    let rounds = 10_000u64;
    let start = Instant::now();

    for round in 0..rounds {
        let t = round * 5_000;
        node.clock().set(t);
        node.run_due();
        for s in 0..sensors {
            let value = 15.0 + s as f64 + (round as f64 * 0.01).cos();
            node.on_sample(DeviceId::new(s), SampleValue::new(value), t);
        }
    }

    let elapsed = start.elapsed();
    println!(
        "{} samples across {} sensors in {:?}",
        sensors * rounds,
        sensors,
        elapsed
    );

    assert_eq!(node.sensors().count(), sensors as usize);
}
