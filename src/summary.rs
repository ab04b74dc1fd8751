// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Grid Summary
//
// Read-only figures derived from a committed state for status panels and
// the headless runner. Nothing here feeds back into the simulation.

use serde::{Deserialize, Serialize};

use crate::engine::RECOVERY_THRESHOLD;
use crate::types::{NodeCondition, SimulationState};

/// Whether the grid as a whole is running hot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoadBand {
    Optimal = 0,
    High = 1,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConditionEntry {
    pub id: String,
    pub condition: NodeCondition,
    pub load_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridSummary {
    pub tick: u64,
    pub is_running: bool,
    /// Nodes with stability below the instability threshold.
    pub unstable_count: u32,
    /// Mean of `load / capacity` across nodes.
    pub average_load_ratio: f64,
    pub load_band: LoadBand,
    /// Mean stability across nodes, in `[0, 1]`.
    pub system_health: f64,
    pub total_load: f64,
    pub total_capacity: f64,
    /// Connections where either endpoint is above 80% of capacity.
    pub heavy_links: Vec<String>,
    pub conditions: Vec<NodeConditionEntry>,
}

impl GridSummary {
    pub fn from_state(state: &SimulationState) -> Self {
        let n = state.nodes.len();
        let (average_load_ratio, system_health) = if n > 0 {
            let ratio_sum: f64 = state.nodes.iter().map(|node| node.load_ratio()).sum();
            let stability_sum: f64 = state.nodes.iter().map(|node| node.stability).sum();
            (ratio_sum / n as f64, stability_sum / n as f64)
        } else {
            (0.0, 0.0)
        };

        let load_band = if average_load_ratio > RECOVERY_THRESHOLD {
            LoadBand::High
        } else {
            LoadBand::Optimal
        };

        let heavy_links = state
            .connections
            .iter()
            .filter(|conn| {
                [&conn.from_id, &conn.to_id].iter().any(|id| {
                    state
                        .node(id)
                        .map_or(false, |node| node.load_ratio() > RECOVERY_THRESHOLD)
                })
            })
            .map(|conn| conn.id.clone())
            .collect();

        Self {
            tick: state.tick,
            is_running: state.is_running,
            unstable_count: state.unstable_count() as u32,
            average_load_ratio,
            load_band,
            system_health,
            total_load: state.nodes.iter().map(|node| node.load).sum(),
            total_capacity: state.nodes.iter().map(|node| node.capacity).sum(),
            heavy_links,
            conditions: state
                .nodes
                .iter()
                .map(|node| NodeConditionEntry {
                    id: node.id.clone(),
                    condition: NodeCondition::of(node),
                    load_ratio: node.load_ratio(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;

    #[test]
    fn test_reference_grid_summary() {
        let state = Topology::reference_grid().initial_state();
        let summary = GridSummary::from_state(&state);
        assert_eq!(summary.unstable_count, 0);
        assert_eq!(summary.system_health, 1.0);
        assert_eq!(summary.load_band, LoadBand::Optimal);
        assert_eq!(summary.total_capacity, 4200.0);
        assert_eq!(summary.total_load, 2050.0);
        // West Plant starts at 75%, nothing is above 80%.
        assert!(summary.heavy_links.is_empty());
        assert!(summary
            .conditions
            .iter()
            .all(|entry| entry.condition == NodeCondition::Nominal));
    }

    #[test]
    fn test_conditions_and_heavy_links() {
        let mut state = Topology::reference_grid().initial_state();
        // West Plant overloaded but still stable.
        state.nodes[3].load = 700.0;
        // Northeast Sub unstable.
        state.nodes[5].stability = 0.4;

        let summary = GridSummary::from_state(&state);
        assert_eq!(summary.unstable_count, 1);
        assert_eq!(summary.conditions[3].condition, NodeCondition::Warning);
        assert_eq!(summary.conditions[5].condition, NodeCondition::Critical);
        assert_eq!(summary.heavy_links, vec!["c3".to_string(), "c7".to_string()]);
    }

    #[test]
    fn test_high_load_band() {
        let mut state = Topology::reference_grid().initial_state();
        for node in state.nodes.iter_mut() {
            node.load = node.capacity * 0.9;
        }
        let summary = GridSummary::from_state(&state);
        assert_eq!(summary.load_band, LoadBand::High);
        assert_eq!(summary.heavy_links.len(), 8);
    }

    #[test]
    fn test_empty_state() {
        let state = SimulationState {
            nodes: Vec::new(),
            connections: Vec::new(),
            is_running: false,
            tick: 0,
        };
        let summary = GridSummary::from_state(&state);
        assert_eq!(summary.average_load_ratio, 0.0);
        assert_eq!(summary.system_health, 0.0);
    }
}
