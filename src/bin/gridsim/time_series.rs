// Per-Tick JSONL Time Series Recorder
// One JSON line per committed tick for offline analysis

use gridsim_engine::{GridSummary, SimulationState};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSample {
    pub id: String,
    pub load: f64,
    pub stability: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSnapshot {
    pub tick: u64,
    pub nodes: Vec<NodeSample>,
    pub unstable_count: u32,
    pub average_load_ratio: f64,
    pub system_health: f64,
    pub total_load: f64,
    pub heavy_links: usize,
}

impl TickSnapshot {
    pub fn from_state(state: &SimulationState) -> Self {
        let summary = GridSummary::from_state(state);
        Self {
            tick: state.tick,
            nodes: state.nodes.iter().map(|n| NodeSample {
                id: n.id.clone(),
                load: n.load,
                stability: n.stability,
            }).collect(),
            unstable_count: summary.unstable_count,
            average_load_ratio: summary.average_load_ratio,
            system_health: summary.system_health,
            total_load: summary.total_load,
            heavy_links: summary.heavy_links.len(),
        }
    }
}

/// Accumulates snapshots in memory and writes them out as JSONL.
#[derive(Default)]
pub struct TimeSeriesRecorder {
    snapshots: Vec<TickSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, state: &SimulationState) {
        self.snapshots.push(TickSnapshot::from_state(state));
    }

    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot).map_err(std::io::Error::other)?;
            writeln!(file, "{}", line)?;
        }
        file.flush()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}
