// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Type Definitions

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

// ─── Node ────────────────────────────────────────────────────────────────────

/// A generation or distribution site in the grid.
///
/// `load` and `stability` change every tick; everything else is fixed once
/// the node is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    /// Current load in MW.
    pub load: f64,
    /// Maximum sustainable load in MW.
    pub capacity: f64,
    /// Health metric in `[0, 1]`.
    pub stability: f64,
    /// Horizontal position, percent of the map width.
    pub x: f64,
    /// Vertical position, percent of the map height.
    pub y: f64,
}

impl Node {
    pub fn load_ratio(&self) -> f64 {
        self.load / self.capacity
    }

    pub fn is_unstable(&self) -> bool {
        self.stability < crate::engine::INSTABILITY_THRESHOLD
    }
}

// ─── Connection ──────────────────────────────────────────────────────────────

/// Directed transmission link. Load may flow either way depending on the
/// relative load ratios of the two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    /// Maximum load moved per tick, MW.
    pub transfer_rate: f64,
}

// ─── SimulationState ─────────────────────────────────────────────────────────

/// One committed snapshot of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub is_running: bool,
    pub tick: u64,
}

impl SimulationState {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn unstable_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_unstable()).count()
    }
}

// ─── NodeCondition ───────────────────────────────────────────────────────────

/// Display classification used by the rendering layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeCondition {
    Nominal = 0,
    Warning = 1,
    Critical = 2,
}

impl NodeCondition {
    pub fn of(node: &Node) -> Self {
        if node.is_unstable() {
            Self::Critical
        } else if node.load_ratio() > crate::engine::RECOVERY_THRESHOLD {
            Self::Warning
        } else {
            Self::Nominal
        }
    }
}

// ─── TickReport ──────────────────────────────────────────────────────────────

/// Load moved along one connection during a tick.
///
/// `amount` is positive when load flowed `from_id -> to_id` and negative when
/// it flowed the other way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub connection_id: String,
    pub from_id: String,
    pub to_id: String,
    pub amount: f64,
}

/// Side information produced alongside a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub tick: u64,
    pub transfers: Vec<TransferRecord>,
    /// Connections whose endpoints could not be resolved this tick.
    pub skipped: Vec<TopologyError>,
}

impl TickReport {
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }
}
