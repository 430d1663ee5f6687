//! WASM bridge exposing the Duffing engine to the browser front-end.

mod analysis;
mod system;

pub use system::WasmDuffing;

use duffing_core::params::{Preset, PRESETS};
use wasm_bindgen::prelude::*;

/// Named parameter sets `[{ name, params, epsilon }]`.
#[wasm_bindgen]
pub fn presets() -> Result<JsValue, JsValue> {
    system::to_js(&PRESETS[..], "presets")
}

/// Preset names in display order.
#[wasm_bindgen]
pub fn preset_names() -> Vec<String> {
    PRESETS.iter().map(|p: &Preset| p.name.to_string()).collect()
}
