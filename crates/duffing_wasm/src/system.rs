//! Core WASM wrapper around a Duffing parameter set and low-level utilities.

use anyhow::bail;
use duffing_core::error::DuffingError;
use duffing_core::grid::GridSpec;
use duffing_core::integrator::{solve_single_on, IntegratorSettings};
use duffing_core::network::{solve_network_with, NetworkSettings, NetworkTrajectory};
use duffing_core::params::DuffingParams;
use duffing_core::Trajectory;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Largest network the bridge accepts for interactive use.
pub(crate) const MAX_NETWORK_SIZE: u32 = 64;

#[wasm_bindgen]
pub struct WasmDuffing {
    pub(crate) params: DuffingParams,
    pub(crate) integrator: IntegratorSettings,
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|err| JsValue::from_str(&format!("Failed to serialize {what}: {err}")))
}

pub(crate) fn core_error(err: DuffingError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn checked_network_size(n: u32) -> anyhow::Result<usize> {
    if n == 0 {
        bail!("Network must contain at least one oscillator.");
    }
    if n > MAX_NETWORK_SIZE {
        bail!("Network size {n} exceeds the interactive limit of {MAX_NETWORK_SIZE}.");
    }
    Ok(n as usize)
}

fn entropy_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

impl WasmDuffing {
    pub(crate) fn trajectory(&self, x0: f64, v0: f64) -> Result<Trajectory, DuffingError> {
        let grid = GridSpec::default().build()?;
        solve_single_on(self.params, [x0, v0], &grid, &self.integrator)
    }

    pub(crate) fn network(
        &self,
        noise_amp: f64,
        coupling: f64,
        n: u32,
        seed: u64,
    ) -> anyhow::Result<NetworkTrajectory> {
        let size = checked_network_size(n)?;
        let mut settings = NetworkSettings::for_noise(noise_amp);
        if noise_amp == 0.0 {
            settings.integrator = self.integrator;
        } else {
            settings.integrator.max_steps = self.integrator.max_steps;
        }
        let trajectory = solve_network_with(
            self.params,
            noise_amp,
            coupling,
            size,
            ChaCha8Rng::seed_from_u64(seed),
            &settings,
        )?;
        Ok(trajectory)
    }
}

#[wasm_bindgen]
impl WasmDuffing {
    #[wasm_bindgen(constructor)]
    pub fn new(delta: f64, alpha: f64, beta: f64, amplitude: f64, frequency: f64) -> WasmDuffing {
        console_error_panic_hook::set_once();
        WasmDuffing {
            params: DuffingParams::new(delta, alpha, beta, amplitude, frequency),
            integrator: IntegratorSettings::default(),
        }
    }

    pub fn set_params(&mut self, delta: f64, alpha: f64, beta: f64, amplitude: f64, frequency: f64) {
        self.params = DuffingParams::new(delta, alpha, beta, amplitude, frequency);
    }

    pub fn get_params(&self) -> Vec<f64> {
        let p = &self.params;
        vec![p.delta, p.alpha, p.beta, p.amplitude, p.frequency]
    }

    /// Tolerances for every integration. Noisy network runs keep their own
    /// looser tolerances.
    pub fn set_tolerances(&mut self, rtol: f64, atol: f64) -> Result<(), JsValue> {
        if !(rtol > 0.0 && atol > 0.0) {
            return Err(JsValue::from_str("Tolerances must be positive."));
        }
        self.integrator.rtol = rtol;
        self.integrator.atol = atol;
        Ok(())
    }

    /// Trajectory `{ t, x, v }` on the default grid.
    pub fn solve_single(&self, x0: f64, v0: f64) -> Result<JsValue, JsValue> {
        let trajectory = self.trajectory(x0, v0).map_err(core_error)?;
        to_js(&trajectory, "trajectory")
    }

    /// Network trajectory `{ size, t, states }`. Without a seed the noise stream
    /// is seeded from `Math.random`, so repeated calls differ.
    pub fn solve_network(
        &self,
        noise_amp: f64,
        coupling: f64,
        n: u32,
        seed: Option<u64>,
    ) -> Result<JsValue, JsValue> {
        let seed = seed.unwrap_or_else(entropy_seed);
        let trajectory = self
            .network(noise_amp, coupling, n, seed)
            .map_err(|e| JsValue::from_str(&format!("Network integration failed: {e}")))?;
        to_js(&trajectory, "network trajectory")
    }
}
