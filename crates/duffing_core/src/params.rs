//! Physical parameters of the Duffing oscillator and the named presets.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Coefficients of x'' + δx' + αx + βx³ = A·cos(φt).
///
/// Values are never validated: negative damping, negative amplitude or any
/// other unusual combination is simulated as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuffingParams {
    /// δ, linear damping.
    pub delta: f64,
    /// α, linear stiffness.
    pub alpha: f64,
    /// β, cubic stiffness.
    pub beta: f64,
    /// A, forcing amplitude.
    pub amplitude: f64,
    /// φ, forcing angular frequency.
    pub frequency: f64,
}

impl Default for DuffingParams {
    fn default() -> Self {
        Self {
            delta: 0.2,
            alpha: 1.0,
            beta: 1.0,
            amplitude: 0.3,
            frequency: 1.2,
        }
    }
}

impl DuffingParams {
    pub const fn new(delta: f64, alpha: f64, beta: f64, amplitude: f64, frequency: f64) -> Self {
        Self {
            delta,
            alpha,
            beta,
            amplitude,
            frequency,
        }
    }

    pub fn with_amplitude(self, amplitude: f64) -> Self {
        Self { amplitude, ..self }
    }

    pub fn with_beta(self, beta: f64) -> Self {
        Self { beta, ..self }
    }

    pub fn with_frequency(self, frequency: f64) -> Self {
        Self { frequency, ..self }
    }

    /// Period 2π/φ of the forcing, or `None` when there is no periodic forcing.
    pub fn forcing_period(&self) -> Option<f64> {
        if self.frequency == 0.0 {
            None
        } else {
            Some(2.0 * PI / self.frequency.abs())
        }
    }
}

/// Default perturbation used for the sensitivity ensemble.
pub const DEFAULT_EPSILON: f64 = 0.05;

/// A named parameter set highlighting a characteristic regime.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub params: DuffingParams,
    pub epsilon: f64,
}

const fn preset(name: &'static str, delta: f64, alpha: f64, beta: f64, a: f64, phi: f64) -> Preset {
    Preset {
        name,
        params: DuffingParams::new(delta, alpha, beta, a, phi),
        epsilon: DEFAULT_EPSILON,
    }
}

pub const PRESETS: [Preset; 11] = [
    preset("Linear resonance", 0.05, 1.0, 0.0, 0.5, 1.0),
    preset("Bistable chaos", 0.05, -1.0, 1.0, 0.35, 1.2),
    preset("Spiral convergence", 0.01, 1.0, 1.0, 0.25, 0.8),
    preset("Homoclinic bifurcation", 0.25, -1.0, 1.0, 0.4, 1.0),
    preset("Strange attractor", 0.2, -1.0, 1.0, 0.65, 1.0),
    preset("Quasi-periodic dynamics", 0.1, 1.0, 0.2, 0.3, 2.5),
    preset("Transition to chaos", 0.15, -0.5, 0.5, 0.72, 0.8),
    preset("Subharmonic resonance", 0.08, 1.0, 0.5, 0.65, 3.0),
    preset("Damped oscillation", 0.1, 1.0, 1.0, 0.0, 0.0),
    preset("Stable periodic oscillation", 0.1, 1.0, 1.0, 0.3, 1.0),
    preset("Period doubling", 0.3, -1.0, 1.0, 0.28, 1.2),
];

/// Looks up a preset by name, ignoring ASCII case.
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
