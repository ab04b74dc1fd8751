//! Browser-facing facade, run with `wasm-pack test --node`.
#![cfg(target_arch = "wasm32")]

use gridsim_engine::GridSimulation;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn facade_lifecycle() {
    let Ok(mut sim) = GridSimulation::new(42) else {
        panic!("reference grid rejected");
    };
    assert!(!sim.is_running());

    sim.toggle_running();
    assert!(!sim.advance(500.0));
    assert!(sim.advance(500.0));
    assert_eq!(sim.get_tick(), 1);

    sim.reset();
    assert_eq!(sim.get_tick(), 0);
    assert!(!sim.is_running());
    assert!(sim.get_last_report().is_null());
}

#[wasm_bindgen_test]
fn facade_rejects_bad_topology() {
    assert!(GridSimulation::from_topology("{\"nodes\": [], \"connections\": []}", 1, 1000).is_err());
}
