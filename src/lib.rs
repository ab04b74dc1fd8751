// Copyright 2026 Hypermesh Foundation. All rights reserved.
// GridSim Power Grid Simulation Core

pub mod types;
pub mod error;
pub mod draws;
pub mod topology;
pub mod engine;
pub mod invariants;
pub mod clock;
pub mod controller;
pub mod summary;

pub use clock::SimulationClock;
pub use controller::{ControllerConfig, SimulationController, StateChange};
pub use draws::{DrawSource, ScriptedDraws};
pub use engine::TickEngine;
pub use error::{InvariantViolation, TopologyError};
pub use summary::GridSummary;
pub use topology::{NodeSpec, Topology};
pub use types::*;

use std::time::Duration;
use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser-facing handle around a [`SimulationController`].
///
/// The page drives time by calling `advance` from its animation loop and
/// reads snapshots back with `get_state` / `get_summary`.
#[wasm_bindgen]
pub struct GridSimulation {
    controller: SimulationController,
}

#[wasm_bindgen]
impl GridSimulation {
    /// Reference grid with a one-second tick.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<GridSimulation, JsError> {
        install_panic_hook();
        let config = ControllerConfig {
            seed,
            ..ControllerConfig::default()
        };
        let controller = SimulationController::new(Topology::reference_grid(), config)?;
        Ok(Self { controller })
    }

    /// Build from a JSON topology document.
    pub fn from_topology(json: &str, seed: u64, period_ms: u32) -> Result<GridSimulation, JsError> {
        install_panic_hook();
        let topology = Topology::from_json(json)?;
        let config = ControllerConfig {
            tick_period: Duration::from_millis(period_ms as u64),
            seed,
        };
        let controller = SimulationController::new(topology, config)?;
        Ok(Self { controller })
    }

    pub fn toggle_running(&mut self) {
        self.controller.toggle_running();
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn reset(&mut self) {
        self.controller.reset();
    }

    /// Report elapsed milliseconds; returns `true` when a tick was applied.
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        let elapsed = Duration::from_secs_f64((elapsed_ms.max(0.0) / 1000.0).min(u32::MAX as f64));
        self.controller.advance(elapsed)
    }

    /// Step once immediately and return the new state.
    pub fn tick(&mut self) -> JsValue {
        let state = self.controller.tick_now();
        serde_wasm_bindgen::to_value(state).unwrap_or(JsValue::NULL)
    }

    pub fn get_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.controller.state()).unwrap_or(JsValue::NULL)
    }

    pub fn get_summary(&self) -> JsValue {
        let summary = GridSummary::from_state(self.controller.state());
        serde_wasm_bindgen::to_value(&summary).unwrap_or(JsValue::NULL)
    }

    pub fn get_last_report(&self) -> JsValue {
        match self.controller.last_report() {
            Some(report) => serde_wasm_bindgen::to_value(report).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    pub fn get_tick(&self) -> u64 {
        self.controller.state().tick
    }

    pub fn reseed(&mut self, seed: u64) {
        self.controller.reseed(seed);
    }
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
}
