// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Tick Engine

use std::collections::HashMap;

use crate::draws::DrawSource;
use crate::error::TopologyError;
use crate::types::{Connection, Node, SimulationState, TickReport, TransferRecord};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Draws below this value lower the load, draws above raise it.
pub const DRIFT_BIAS: f64 = 0.45;
/// Width of the drift band in MW, giving roughly [-9, +11] per tick.
pub const DRIFT_SCALE: f64 = 20.0;
/// Stability lost per tick while overloaded.
pub const STABILITY_DECAY: f64 = 0.05;
/// Stability regained per tick while lightly loaded.
pub const STABILITY_RECOVERY: f64 = 0.02;
/// Load ratio below which a node recovers stability.
pub const RECOVERY_THRESHOLD: f64 = 0.8;
/// Stability below which a node feeds extra load back into itself.
pub const INSTABILITY_THRESHOLD: f64 = 0.5;
/// Extra load per tick at zero stability.
pub const INSTABILITY_LOAD_FACTOR: f64 = 15.0;
/// Converts a load-ratio gap into MW of transfer.
pub const TRANSFER_SCALE: f64 = 100.0;

// ─── TickEngine ──────────────────────────────────────────────────────────────

/// Pure state transition for the grid.
///
/// A step runs four phases in a fixed order:
///
/// 1. drift: one draw per node, in node order
/// 2. stability update from the post-drift load
/// 3. instability feedback from the updated stability
/// 4. load transfer, one connection at a time in list order
///
/// Phases 1-3 only touch their own node, so they run as a single pass.
/// Phase 4 is sequential: each connection sees the loads left behind by the
/// connections before it in the same tick.
pub struct TickEngine;

impl TickEngine {
    /// Compute the next state. The input is left untouched.
    pub fn step<D: DrawSource + ?Sized>(state: &SimulationState, draws: &mut D) -> SimulationState {
        Self::step_with_report(state, draws).0
    }

    /// Like [`step`](Self::step), also returning the transfers applied and
    /// any connections skipped because an endpoint could not be resolved.
    pub fn step_with_report<D: DrawSource + ?Sized>(
        state: &SimulationState,
        draws: &mut D,
    ) -> (SimulationState, TickReport) {
        let mut nodes = state.nodes.clone();

        for node in nodes.iter_mut() {
            apply_drift(node, draws.next_unit());
            update_stability(node);
            apply_instability_feedback(node);
        }

        let tick = state.tick + 1;
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };
        transfer_load(&mut nodes, &state.connections, &mut report);

        let next = SimulationState {
            nodes,
            connections: state.connections.clone(),
            is_running: state.is_running,
            tick,
        };
        (next, report)
    }
}

// ─── Phases ──────────────────────────────────────────────────────────────────

fn apply_drift(node: &mut Node, draw: f64) {
    let drift = (draw - DRIFT_BIAS) * DRIFT_SCALE;
    node.load = (node.load + drift).max(0.0);
}

/// Exactly one branch applies; between 80% and 100% stability holds.
fn update_stability(node: &mut Node) {
    if node.load > node.capacity {
        node.stability = (node.stability - STABILITY_DECAY).max(0.0);
    } else if node.load < node.capacity * RECOVERY_THRESHOLD {
        node.stability = (node.stability + STABILITY_RECOVERY).min(1.0);
    }
}

fn apply_instability_feedback(node: &mut Node) {
    if node.stability < INSTABILITY_THRESHOLD {
        node.load = (node.load + (1.0 - node.stability) * INSTABILITY_LOAD_FACTOR).max(0.0);
    }
}

/// Move load from the relatively heavier endpoint to the lighter one.
///
/// The amount is bounded by the connection's rate, the ratio gap, and the
/// giving node's current load, so no load goes negative.
fn transfer_load(nodes: &mut [Node], connections: &[Connection], report: &mut TickReport) {
    let index: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();

    for conn in connections {
        let (from, to) = match (index.get(&conn.from_id), index.get(&conn.to_id)) {
            (Some(&f), Some(&t)) => (f, t),
            (None, _) => {
                report.skipped.push(unknown_endpoint(conn, &conn.from_id));
                continue;
            }
            (_, None) => {
                report.skipped.push(unknown_endpoint(conn, &conn.to_id));
                continue;
            }
        };
        if from == to {
            continue;
        }

        let from_ratio = nodes[from].load_ratio();
        let to_ratio = nodes[to].load_ratio();

        let signed = if from_ratio > to_ratio {
            let amount = bounded_transfer(conn, from_ratio - to_ratio, nodes[from].load);
            nodes[from].load -= amount;
            nodes[to].load += amount;
            amount
        } else if to_ratio > from_ratio {
            let amount = bounded_transfer(conn, to_ratio - from_ratio, nodes[to].load);
            nodes[to].load -= amount;
            nodes[from].load += amount;
            -amount
        } else {
            continue;
        };

        report.transfers.push(TransferRecord {
            connection_id: conn.id.clone(),
            from_id: conn.from_id.clone(),
            to_id: conn.to_id.clone(),
            amount: signed,
        });
    }
}

fn bounded_transfer(conn: &Connection, ratio_gap: f64, source_load: f64) -> f64 {
    conn.transfer_rate
        .min(ratio_gap * TRANSFER_SCALE)
        .min(source_load)
        .max(0.0)
}

fn unknown_endpoint(conn: &Connection, node: &str) -> TopologyError {
    TopologyError::UnknownEndpoint {
        connection: conn.id.clone(),
        node: node.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draws::{seeded, ScriptedDraws};
    use crate::invariants::check_state;

    fn node(id: &str, load: f64, capacity: f64, stability: f64) -> Node {
        Node {
            id: id.to_string(),
            name: id.to_uppercase(),
            load,
            capacity,
            stability,
            x: 50.0,
            y: 50.0,
        }
    }

    fn state(nodes: Vec<Node>, connections: Vec<Connection>) -> SimulationState {
        SimulationState {
            nodes,
            connections,
            is_running: true,
            tick: 0,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_drift_range() {
        let mut n = node("a", 100.0, 1000.0, 1.0);
        apply_drift(&mut n, 0.0);
        assert_close(n.load, 91.0);

        let mut n = node("a", 100.0, 1000.0, 1.0);
        apply_drift(&mut n, 1.0);
        assert_close(n.load, 111.0);

        let mut n = node("a", 3.0, 1000.0, 1.0);
        apply_drift(&mut n, 0.0);
        assert_eq!(n.load, 0.0, "drift must floor load at zero");
    }

    #[test]
    fn test_overloaded_node_loses_stability() {
        let s = state(vec![node("a", 1200.0, 1000.0, 1.0)], Vec::new());
        let next = TickEngine::step(&s, &mut ScriptedDraws::neutral());
        assert_close(next.nodes[0].stability, 0.95);
        assert_close(next.nodes[0].load, 1200.0);
    }

    #[test]
    fn test_unstable_node_feeds_back_load() {
        let s = state(vec![node("b", 300.0, 1000.0, 0.3)], Vec::new());
        let next = TickEngine::step(&s, &mut ScriptedDraws::neutral());
        assert_close(next.nodes[0].stability, 0.32);
        assert_close(next.nodes[0].load, 310.2);
    }

    #[test]
    fn test_stability_band_holds() {
        let s = state(vec![node("a", 900.0, 1000.0, 0.7)], Vec::new());
        let next = TickEngine::step(&s, &mut ScriptedDraws::neutral());
        assert_eq!(next.nodes[0].stability, 0.7);
        assert_eq!(next.nodes[0].load, 900.0);
    }

    #[test]
    fn test_stability_clamped() {
        let s = state(
            vec![node("low", 2000.0, 1000.0, 0.01), node("high", 10.0, 1000.0, 0.99)],
            Vec::new(),
        );
        let next = TickEngine::step(&s, &mut ScriptedDraws::neutral());
        assert_eq!(next.nodes[0].stability, 0.0);
        assert_eq!(next.nodes[1].stability, 1.0);
        // Zero stability adds the full feedback.
        assert_close(next.nodes[0].load, 2015.0);
    }

    #[test]
    fn test_transfer_capped_by_rate() {
        let s = state(
            vec![node("x", 800.0, 1000.0, 1.0), node("y", 100.0, 500.0, 1.0)],
            vec![Connection::new("xy", "x", "y", 50.0)],
        );
        let (next, report) = TickEngine::step_with_report(&s, &mut ScriptedDraws::neutral());
        assert_close(next.nodes[0].load, 750.0);
        assert_close(next.nodes[1].load, 150.0);
        assert_eq!(report.transfers.len(), 1);
        assert_close(report.transfers[0].amount, 50.0);
    }

    #[test]
    fn test_transfer_flows_against_direction() {
        let s = state(
            vec![node("x", 100.0, 1000.0, 1.0), node("y", 400.0, 500.0, 1.0)],
            vec![Connection::new("xy", "x", "y", 30.0)],
        );
        let (next, report) = TickEngine::step_with_report(&s, &mut ScriptedDraws::neutral());
        assert_close(next.nodes[0].load, 130.0);
        assert_close(next.nodes[1].load, 370.0);
        assert_close(report.transfers[0].amount, -30.0);
    }

    #[test]
    fn test_transfer_capped_by_ratio_gap() {
        let s = state(
            vec![node("x", 300.0, 1000.0, 1.0), node("y", 100.0, 1000.0, 1.0)],
            vec![Connection::new("xy", "x", "y", 50.0)],
        );
        let next = TickEngine::step(&s, &mut ScriptedDraws::neutral());
        assert_close(next.nodes[0].load, 280.0);
        assert_close(next.nodes[1].load, 120.0);
    }

    #[test]
    fn test_transfer_capped_by_source_load() {
        let s = state(
            vec![node("x", 5.0, 10.0, 1.0), node("y", 0.0, 1000.0, 1.0)],
            vec![Connection::new("xy", "x", "y", 100.0)],
        );
        let next = TickEngine::step(&s, &mut ScriptedDraws::neutral());
        assert_eq!(next.nodes[0].load, 0.0);
        assert_close(next.nodes[1].load, 5.0);
    }

    #[test]
    fn test_equal_ratios_do_not_transfer() {
        let s = state(
            vec![node("x", 200.0, 1000.0, 1.0), node("y", 100.0, 500.0, 1.0)],
            vec![Connection::new("xy", "x", "y", 50.0)],
        );
        let (next, report) = TickEngine::step_with_report(&s, &mut ScriptedDraws::neutral());
        assert_eq!(next.nodes[0].load, 200.0);
        assert_eq!(next.nodes[1].load, 100.0);
        assert!(report.transfers.is_empty());
    }

    #[test]
    fn test_connections_see_earlier_transfers() {
        let nodes = vec![
            node("p", 900.0, 1000.0, 1.0),
            node("q", 100.0, 1000.0, 1.0),
            node("r", 100.0, 1000.0, 1.0),
        ];
        let pq = Connection::new("pq", "p", "q", 100.0);
        let pr = Connection::new("pr", "p", "r", 100.0);

        let s = state(nodes.clone(), vec![pq.clone(), pr.clone()]);
        let next = TickEngine::step(&s, &mut ScriptedDraws::neutral());
        // pq moves 80; pr then sees p at 820 and moves 72.
        assert_close(next.nodes[0].load, 748.0);
        assert_close(next.nodes[1].load, 180.0);
        assert_close(next.nodes[2].load, 172.0);

        let reversed = state(nodes, vec![pr, pq]);
        let next = TickEngine::step(&reversed, &mut ScriptedDraws::neutral());
        assert_close(next.nodes[0].load, 748.0);
        assert_close(next.nodes[1].load, 172.0);
        assert_close(next.nodes[2].load, 180.0);
    }

    #[test]
    fn test_unresolved_connection_skipped_and_reported() {
        let s = state(
            vec![node("x", 800.0, 1000.0, 1.0), node("y", 100.0, 500.0, 1.0)],
            vec![
                Connection::new("dangling", "x", "ghost", 50.0),
                Connection::new("xy", "x", "y", 50.0),
            ],
        );
        let (next, report) = TickEngine::step_with_report(&s, &mut ScriptedDraws::neutral());
        assert_eq!(
            report.skipped,
            vec![TopologyError::UnknownEndpoint {
                connection: "dangling".into(),
                node: "ghost".into(),
            }]
        );
        assert_close(next.nodes[0].load, 750.0);
        assert_eq!(next.connections, s.connections);
    }

    #[test]
    fn test_step_is_pure() {
        let s = crate::topology::Topology::reference_grid().initial_state();
        let before = s.clone();
        let a = TickEngine::step(&s, &mut seeded(11));
        let b = TickEngine::step(&s, &mut seeded(11));
        assert_eq!(s, before, "input state mutated");
        assert_eq!(a, b);
    }

    #[test]
    fn test_tick_and_running_flag() {
        let mut s = crate::topology::Topology::reference_grid().initial_state();
        s.is_running = false;
        let next = TickEngine::step(&s, &mut seeded(1));
        assert_eq!(next.tick, 1);
        assert!(!next.is_running);
    }

    #[test]
    fn test_one_draw_per_node() {
        let s = crate::topology::Topology::reference_grid().initial_state();
        let mut draws = ScriptedDraws::neutral();
        TickEngine::step(&s, &mut draws);
        assert_eq!(draws.consumed(), s.nodes.len());
    }

    #[test]
    fn test_long_run_keeps_invariants() {
        let mut rng = seeded(2024);
        let mut s = crate::topology::Topology::reference_grid().initial_state();
        for _ in 0..2_000 {
            let next = TickEngine::step(&s, &mut rng);
            check_state(&next, Some(&s)).unwrap();
            s = next;
        }
        assert_eq!(s.tick, 2_000);
    }
}
