// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - State Invariants

use std::collections::HashSet;

use crate::error::{InvariantViolation, TopologyError};
use crate::types::SimulationState;

/// Verify the invariants every committed state must satisfy.
///
/// With a `previous` state, also checks the step relation: same node set in
/// the same order, unchanged capacities, tick advanced by exactly one.
pub fn check_state(
    state: &SimulationState,
    previous: Option<&SimulationState>,
) -> Result<(), InvariantViolation> {
    check_structure(state)?;

    for node in &state.nodes {
        if !(node.load >= 0.0) {
            return Err(InvariantViolation::NegativeLoad {
                node: node.id.clone(),
                load: node.load,
            });
        }
        if !(0.0..=1.0).contains(&node.stability) {
            return Err(InvariantViolation::StabilityOutOfRange {
                node: node.id.clone(),
                stability: node.stability,
            });
        }
    }

    if let Some(prev) = previous {
        if state.tick != prev.tick + 1 {
            return Err(InvariantViolation::TickSkew {
                before: prev.tick,
                after: state.tick,
            });
        }
        if state.nodes.len() != prev.nodes.len() {
            return Err(InvariantViolation::NodeSetChanged);
        }
        for (before, after) in prev.nodes.iter().zip(&state.nodes) {
            if before.id != after.id {
                return Err(InvariantViolation::NodeSetChanged);
            }
            if before.capacity.to_bits() != after.capacity.to_bits() {
                return Err(InvariantViolation::CapacityChanged {
                    node: after.id.clone(),
                    before: before.capacity,
                    after: after.capacity,
                });
            }
        }
    }

    Ok(())
}

/// Unique node ids and resolvable connection endpoints.
fn check_structure(state: &SimulationState) -> Result<(), TopologyError> {
    let mut ids = HashSet::with_capacity(state.nodes.len());
    for node in &state.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(TopologyError::DuplicateNode(node.id.clone()));
        }
    }
    for conn in &state.connections {
        for endpoint in [&conn.from_id, &conn.to_id] {
            if !ids.contains(endpoint.as_str()) {
                return Err(TopologyError::UnknownEndpoint {
                    connection: conn.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
    }
    Ok(())
}
