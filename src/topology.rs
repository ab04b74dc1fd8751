// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Network Topology
//
// The fixed node/connection set a simulation starts from. A topology is
// validated once, up front; everything downstream may assume ids are unique
// and every connection endpoint exists.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::types::{Connection, Node, SimulationState};

/// Lowest and highest map coordinate, in percent.
const POSITION_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

// ─── NodeSpec ────────────────────────────────────────────────────────────────

/// Initial description of a node. Stability is not configurable: every node
/// starts fully stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    pub name: String,
    pub load: f64,
    pub capacity: f64,
    pub x: f64,
    pub y: f64,
}

impl NodeSpec {
    pub fn new(id: &str, name: &str, load: f64, capacity: f64, x: f64, y: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            load,
            capacity,
            x,
            y,
        }
    }

    fn to_node(&self) -> Node {
        Node {
            id: self.id.clone(),
            name: self.name.clone(),
            load: self.load,
            capacity: self.capacity,
            stability: 1.0,
            x: self.x,
            y: self.y,
        }
    }
}

impl Connection {
    pub fn new(id: &str, from_id: &str, to_id: &str, transfer_rate: f64) -> Self {
        Self {
            id: id.to_string(),
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
            transfer_rate,
        }
    }
}

// ─── Topology ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<NodeSpec>,
    pub connections: Vec<Connection>,
}

impl Topology {
    /// Build and validate a topology.
    pub fn new(nodes: Vec<NodeSpec>, connections: Vec<Connection>) -> Result<Self, TopologyError> {
        let topology = Self { nodes, connections };
        topology.validate()?;
        Ok(topology)
    }

    /// The seven-node, eight-connection grid the simulation ships with.
    pub fn reference_grid() -> Self {
        Self {
            nodes: vec![
                NodeSpec::new("n1", "Central Hub", 450.0, 1000.0, 50.0, 50.0),
                NodeSpec::new("n2", "North Station", 200.0, 500.0, 50.0, 15.0),
                NodeSpec::new("n3", "South Station", 200.0, 500.0, 50.0, 85.0),
                NodeSpec::new("n4", "West Plant", 600.0, 800.0, 15.0, 50.0),
                NodeSpec::new("n5", "East Plant", 300.0, 600.0, 85.0, 50.0),
                NodeSpec::new("n6", "Northeast Sub", 150.0, 400.0, 80.0, 20.0),
                NodeSpec::new("n7", "Northwest Sub", 150.0, 400.0, 20.0, 20.0),
            ],
            connections: vec![
                Connection::new("c1", "n1", "n2", 50.0),
                Connection::new("c2", "n1", "n3", 50.0),
                Connection::new("c3", "n1", "n4", 100.0),
                Connection::new("c4", "n1", "n5", 100.0),
                Connection::new("c5", "n2", "n6", 30.0),
                Connection::new("c6", "n2", "n7", 30.0),
                Connection::new("c7", "n4", "n7", 50.0),
                Connection::new("c8", "n5", "n6", 50.0),
            ],
        }
    }

    /// Parse a topology document and validate it.
    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        let topology: Topology = serde_json::from_str(json)?;
        topology.validate()?;
        Ok(topology)
    }

    pub fn to_json(&self) -> Result<String, TopologyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject anything the engine cannot simulate.
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.nodes.is_empty() {
            return Err(TopologyError::Empty);
        }

        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for spec in &self.nodes {
            if !node_ids.insert(spec.id.as_str()) {
                return Err(TopologyError::DuplicateNode(spec.id.clone()));
            }
            validate_node(spec)?;
        }

        let mut connection_ids = HashSet::with_capacity(self.connections.len());
        for conn in &self.connections {
            if !connection_ids.insert(conn.id.as_str()) {
                return Err(TopologyError::DuplicateConnection(conn.id.clone()));
            }
            for endpoint in [&conn.from_id, &conn.to_id] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(TopologyError::UnknownEndpoint {
                        connection: conn.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
            if conn.from_id == conn.to_id {
                return Err(TopologyError::SelfLoop(conn.id.clone()));
            }
            if !conn.transfer_rate.is_finite() || conn.transfer_rate <= 0.0 {
                return Err(TopologyError::InvalidTransferRate(
                    conn.id.clone(),
                    conn.transfer_rate,
                ));
            }
        }

        Ok(())
    }

    /// Fresh state: every node fully stable, tick zero, paused.
    ///
    /// Each call produces an independent copy.
    pub fn initial_state(&self) -> SimulationState {
        SimulationState {
            nodes: self.nodes.iter().map(NodeSpec::to_node).collect(),
            connections: self.connections.clone(),
            is_running: false,
            tick: 0,
        }
    }
}

fn validate_node(spec: &NodeSpec) -> Result<(), TopologyError> {
    let invalid = |field: &'static str, value: f64| TopologyError::InvalidNode {
        node: spec.id.clone(),
        field,
        value,
    };
    if !spec.load.is_finite() || spec.load < 0.0 {
        return Err(invalid("load", spec.load));
    }
    if !spec.capacity.is_finite() || spec.capacity <= 0.0 {
        return Err(invalid("capacity", spec.capacity));
    }
    if !POSITION_RANGE.contains(&spec.x) {
        return Err(invalid("x", spec.x));
    }
    if !POSITION_RANGE.contains(&spec.y) {
        return Err(invalid("y", spec.y));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
