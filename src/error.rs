// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Error Types

use serde::Serialize;

// ---------------------------------------------------------------------------
// Topology errors
// ---------------------------------------------------------------------------

/// Structural problems with a node/connection set.
///
/// Raised by [`Topology::validate`](crate::topology::Topology::validate) at
/// construction and reset time. `UnknownEndpoint` can also surface at tick
/// time inside a [`TickReport`](crate::types::TickReport), where it is
/// recoverable: the affected connection is skipped for that tick.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
pub enum TopologyError {
    #[error("topology has no nodes")]
    Empty,

    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),

    #[error("duplicate connection id `{0}`")]
    DuplicateConnection(String),

    #[error("connection `{connection}` references unknown node `{node}`")]
    UnknownEndpoint { connection: String, node: String },

    #[error("connection `{0}` connects a node to itself")]
    SelfLoop(String),

    #[error("node `{node}` has invalid {field}: {value}")]
    InvalidNode {
        node: String,
        field: &'static str,
        value: f64,
    },

    #[error("connection `{0}` has invalid transfer rate: {1}")]
    InvalidTransferRate(String, f64),

    #[error("malformed topology document: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for TopologyError {
    fn from(e: serde_json::Error) -> Self {
        TopologyError::Parse(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Invariant violations
// ---------------------------------------------------------------------------

/// A committed state broke one of the simulation invariants.
///
/// These indicate an arithmetic bug in the engine, not bad input, and are
/// treated as fatal by the controller in debug builds.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("node `{node}` has negative load {load}")]
    NegativeLoad { node: String, load: f64 },

    #[error("node `{node}` stability {stability} outside [0, 1]")]
    StabilityOutOfRange { node: String, stability: f64 },

    #[error("node `{node}` capacity changed from {before} to {after}")]
    CapacityChanged { node: String, before: f64, after: f64 },

    #[error("tick advanced from {before} to {after}")]
    TickSkew { before: u64, after: u64 },

    #[error("node set changed between states")]
    NodeSetChanged,

    #[error(transparent)]
    Topology(#[from] TopologyError),
}
