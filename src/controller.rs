// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation - Simulation Controller

use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{SimulationClock, DEFAULT_TICK_PERIOD};
use crate::draws::{self, DrawSource};
use crate::engine::TickEngine;
use crate::error::TopologyError;
use crate::invariants;
use crate::topology::Topology;
use crate::types::{SimulationState, TickReport};

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Wall-clock time between ticks while running.
    pub tick_period: Duration,
    /// Seed for the drift generator.
    pub seed: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            seed: 0,
        }
    }
}

// ─── Observers ───────────────────────────────────────────────────────────────

/// Why a new state was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateChange {
    Tick,
    Started,
    Paused,
    Reset,
}

type Observer = Box<dyn FnMut(&SimulationState, StateChange)>;

// ─── SimulationController ────────────────────────────────────────────────────

/// Owns the current state and mediates every external request.
///
/// The clock, the draw source and the engine are private: callers only start,
/// pause, reset, read, and report elapsed time. Each tick replaces the stored
/// state wholesale, so observers and readers only ever see committed states.
pub struct SimulationController<D: DrawSource = ChaCha8Rng> {
    topology: Topology,
    state: SimulationState,
    clock: SimulationClock,
    draws: D,
    observers: Vec<Observer>,
    last_report: Option<TickReport>,
}

impl SimulationController<ChaCha8Rng> {
    /// Controller with a ChaCha8 drift generator seeded from `config`.
    pub fn new(topology: Topology, config: ControllerConfig) -> Result<Self, TopologyError> {
        Self::with_draws(topology, config.tick_period, draws::seeded(config.seed))
    }

    /// Restart the drift generator from `seed`. State is left as is.
    pub fn reseed(&mut self, seed: u64) {
        self.draws = draws::seeded(seed);
    }
}

impl<D: DrawSource> SimulationController<D> {
    /// Controller with an injected draw source. The topology is validated
    /// here and rejected if malformed.
    pub fn with_draws(
        topology: Topology,
        tick_period: Duration,
        draws: D,
    ) -> Result<Self, TopologyError> {
        topology.validate()?;
        let state = topology.initial_state();
        info!(
            nodes = state.nodes.len(),
            connections = state.connections.len(),
            period_ms = tick_period.as_millis() as u64,
            "simulation controller created"
        );
        Ok(Self {
            topology,
            state,
            clock: SimulationClock::new(tick_period),
            draws,
            observers: Vec::new(),
            last_report: None,
        })
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> SimulationState {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Report from the most recent tick, cleared by reset.
    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Register a callback invoked after every published change.
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&SimulationState, StateChange) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn toggle_running(&mut self) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Start the clock. No tick runs until a full period has elapsed.
    pub fn start(&mut self) {
        if self.state.is_running {
            return;
        }
        self.state.is_running = true;
        self.clock.start();
        info!(tick = self.state.tick, "simulation started");
        self.publish(StateChange::Started);
    }

    /// Stop the clock immediately; a partially elapsed period is dropped.
    pub fn pause(&mut self) {
        if !self.state.is_running {
            return;
        }
        self.state.is_running = false;
        self.clock.stop();
        info!(tick = self.state.tick, "simulation paused");
        self.publish(StateChange::Paused);
    }

    /// Restore the initial topology: full stability, tick zero, paused.
    pub fn reset(&mut self) {
        self.clock.stop();
        self.state = self.topology.initial_state();
        self.last_report = None;
        info!("simulation reset");
        self.publish(StateChange::Reset);
    }

    /// Feed elapsed wall-clock time to the clock. Returns `true` when a tick
    /// was applied.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        if !self.clock.advance(elapsed) {
            return false;
        }
        self.on_clock_signal()
    }

    /// Apply one step now, regardless of the running flag or the clock.
    pub fn tick_now(&mut self) -> &SimulationState {
        self.apply_step();
        &self.state
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn on_clock_signal(&mut self) -> bool {
        if !self.state.is_running {
            return false;
        }
        self.apply_step();
        true
    }

    fn apply_step(&mut self) {
        let (next, report) = TickEngine::step_with_report(&self.state, &mut self.draws);

        for skipped in &report.skipped {
            warn!(tick = report.tick, error = %skipped, "connection skipped");
        }

        if cfg!(debug_assertions) {
            if let Err(violation) = invariants::check_state(&next, Some(&self.state)) {
                panic!("tick {} broke a state invariant: {}", report.tick, violation);
            }
        }

        debug!(
            tick = next.tick,
            unstable = next.unstable_count(),
            transfers = report.transfers.len(),
            "grid tick"
        );

        self.state = next;
        self.last_report = Some(report);
        self.publish(StateChange::Tick);
    }

    fn publish(&mut self, change: StateChange) {
        for observer in self.observers.iter_mut() {
            observer(&self.state, change);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
