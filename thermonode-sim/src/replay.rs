// thermonode-sim - Trace replay engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Trace replay engine.
//!
//! Feeds a recorded sensor trace through a [`Node`] driven by a manual
//! clock, so a day of readings replays in milliseconds. Before each row
//! the clock jumps to the row's timestamp and due timers run, exactly as
//! the firmware scheduler would have run them.

use std::path::Path;

use serde::Serialize;
use thermonode::{
    topic_for, Clock, DeviceId, FixedBattery, ManualClock, Node, NodeConfig, NodeError, NodeEvent,
    ReconfigureCommand, RecordingDisplay, RecordingDriver, RecordingPublisher, SampleValue,
    Timestamp,
};
use tracing::{debug, info};

type SimNode =
    Node<ManualClock, RecordingDriver, RecordingPublisher, RecordingDisplay, FixedBattery>;

/// One trace row.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub timestamp_ms: Timestamp,
    pub device_id: DeviceId,
    pub value: SampleValue,
}

/// A value handed to the radio during replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishRecord {
    pub timestamp_ms: Timestamp,
    pub topic: String,
    pub value: f64,
}

/// A polling change applied during replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconfigureRecord {
    pub timestamp_ms: Timestamp,
    pub interval_ms: u64,
}

/// Per-sensor gate counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSummary {
    pub device_id: String,
    pub evaluated: u64,
    pub published: u64,
    pub skipped: u64,
    pub unavailable: u64,
}

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    pub samples: usize,
    pub publishes: Vec<PublishRecord>,
    pub reconfigurations: Vec<ReconfigureRecord>,
    pub battery_reports: usize,
    pub sensors: Vec<SensorSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<f64>,
}

/// Replay engine around a simulated node.
pub struct ReplayEngine {
    node: SimNode,
}

impl ReplayEngine {
    /// Create an engine whose node boots at `start_ms`.
    pub fn new(
        config: NodeConfig,
        start_ms: Timestamp,
        battery: Option<f32>,
    ) -> Result<Self, SimError> {
        let mut node = Node::new(
            config,
            ManualClock::new(start_ms),
            RecordingDriver::new(),
            RecordingPublisher::new(),
            RecordingDisplay::new(),
            FixedBattery(battery),
        )?;
        node.start();
        Ok(Self { node })
    }

    /// Parse a `timestamp_ms,device_id,value` trace.
    ///
    /// An empty value is a failed read. Device ids are hexadecimal.
    pub fn parse_csv(path: &Path) -> Result<Vec<TraceRow>, SimError> {
        if !path.exists() {
            return Err(SimError::FileNotFound(path.display().to_string()));
        }
        let mut reader = csv::Reader::from_path(path)?;

        let headers = reader.headers()?.clone();
        let header_strs: Vec<&str> = headers.iter().map(str::trim).collect();
        if header_strs != ["timestamp_ms", "device_id", "value"] {
            return Err(SimError::InvalidFormat(
                "Header must be 'timestamp_ms,device_id,value'".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result?;
            let field = |i: usize| record.get(i).map(str::trim).unwrap_or("");

            let timestamp_ms: Timestamp = field(0).parse().map_err(|_| {
                SimError::InvalidFormat(format!("Invalid timestamp on row {}", line + 1))
            })?;
            let device_id = DeviceId::from_hex(field(1)).ok_or_else(|| {
                SimError::InvalidFormat(format!("Invalid device id on row {}", line + 1))
            })?;
            let value = match field(2) {
                "" => SampleValue::unavailable(),
                s => s.parse::<f64>().map(SampleValue::new).map_err(|_| {
                    SimError::InvalidFormat(format!("Invalid value on row {}", line + 1))
                })?,
            };

            rows.push(TraceRow {
                timestamp_ms,
                device_id,
                value,
            });
        }

        if rows.is_empty() {
            return Err(SimError::EmptyTrace);
        }
        Ok(rows)
    }

    /// Replay `rows` in order.
    pub fn run(&mut self, rows: &[TraceRow]) -> ReplayReport {
        let mut publishes = Vec::new();
        let mut reconfigurations = Vec::new();
        let mut battery_reports = 0;

        for row in rows {
            self.node.clock().set(row.timestamp_ms);
            for event in self.node.run_due() {
                match event {
                    NodeEvent::Reconfigured(ReconfigureCommand::SetPollingInterval(ms)) => {
                        info!("polling every {}ms from {}", ms, row.timestamp_ms);
                        reconfigurations.push(ReconfigureRecord {
                            timestamp_ms: self.node.clock().now(),
                            interval_ms: ms,
                        });
                    }
                    NodeEvent::BatteryPublished(_) => battery_reports += 1,
                    NodeEvent::BatteryUnavailable => {}
                }
            }

            let decision = self.node.on_sample(row.device_id, row.value, row.timestamp_ms);
            debug!("{} @{}: {:?}", row.device_id, row.timestamp_ms, decision);
            if let Some(value) = decision.published_value() {
                publishes.push(PublishRecord {
                    timestamp_ms: row.timestamp_ms,
                    topic: topic_for(row.device_id),
                    value,
                });
            }
        }

        let mut sensors: Vec<SensorSummary> = self
            .node
            .sensors()
            .filter_map(|id| {
                let stats = self.node.gate(id)?.stats();
                Some(SensorSummary {
                    device_id: id.to_string(),
                    evaluated: stats.evaluated,
                    published: stats.published,
                    skipped: stats.skipped,
                    unavailable: stats.unavailable,
                })
            })
            .collect();
        sensors.sort_by(|a, b| a.device_id.cmp(&b.device_id));

        ReplayReport {
            samples: rows.len(),
            publishes,
            reconfigurations,
            battery_reports,
            sensors,
            display: self.node.display().current().value(),
        }
    }

    /// Simulated node.
    pub fn node(&self) -> &SimNode {
        &self.node
    }
}

/// Replay errors.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Empty trace")]
    EmptyTrace,

    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp_ms,device_id,value").unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_csv() {
        let file = create_test_csv(&["0,28ff01,20.0", "5000,28ff01,", "10000,0x28ff02,21.5"]);
        let rows = ReplayEngine::parse_csv(file.path()).expect("Failed to parse CSV");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].device_id, DeviceId::new(0x28ff01));
        assert_eq!(rows[0].value, SampleValue::new(20.0));
        assert!(!rows[1].value.is_valid());
        assert_eq!(rows[2].device_id, DeviceId::new(0x28ff02));
    }

    #[test]
    fn test_parse_csv_bad_header() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "time,temp").unwrap();
        writeln!(file, "0,20.0").unwrap();
        file.flush().unwrap();

        let result = ReplayEngine::parse_csv(file.path());
        assert!(matches!(result, Err(SimError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_csv_bad_value() {
        let file = create_test_csv(&["0,1,warm"]);
        assert!(matches!(
            ReplayEngine::parse_csv(file.path()),
            Err(SimError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_csv_empty() {
        let file = create_test_csv(&[]);
        assert!(matches!(
            ReplayEngine::parse_csv(file.path()),
            Err(SimError::EmptyTrace)
        ));
    }

    #[test]
    fn test_parse_csv_missing_file() {
        let result = ReplayEngine::parse_csv(Path::new("/nonexistent/trace.csv"));
        assert!(matches!(result, Err(SimError::FileNotFound(_))));
    }

    #[test]
    fn test_replay_threshold_scenario() {
        let file = create_test_csv(&["0,a,20.0", "5000,a,20.3", "10000,a,21.0"]);
        let rows = ReplayEngine::parse_csv(file.path()).unwrap();
        let mut engine = ReplayEngine::new(NodeConfig::default(), 0, None).unwrap();

        let report = engine.run(&rows);

        let times: Vec<_> = report.publishes.iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(times, vec![0, 10000]);
        assert_eq!(report.publishes[0].topic, "thermometer/a/temperature");
        assert_eq!(report.sensors[0].skipped, 1);
        assert_eq!(report.display, Some(21.0));
    }

    #[test]
    fn test_replay_switches_polling() {
        let file = create_test_csv(&["0,a,20.0", "600000,a,20.0", "1800000,a,20.0"]);
        let rows = ReplayEngine::parse_csv(file.path()).unwrap();
        let mut engine = ReplayEngine::new(NodeConfig::default(), 0, Some(3.1)).unwrap();

        let report = engine.run(&rows);

        assert_eq!(
            report.reconfigurations,
            vec![ReconfigureRecord {
                timestamp_ms: 600000,
                interval_ms: 60_000
            }]
        );
        assert_eq!(report.battery_reports, 1);
        assert_eq!(engine.node().driver().intervals(), &[5_000, 60_000]);
    }

    #[test]
    fn test_report_serializes() {
        let file = create_test_csv(&["0,a,20.0"]);
        let rows = ReplayEngine::parse_csv(file.path()).unwrap();
        let mut engine = ReplayEngine::new(NodeConfig::default(), 0, None).unwrap();

        let json = serde_json::to_string(&engine.run(&rows)).unwrap();
        assert!(json.contains("\"samples\":1"));
        assert!(json.contains("thermometer/a/temperature"));
    }
}
