//! Vector field of the single forced Duffing oscillator.

use crate::params::DuffingParams;
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

/// The Duffing equation as a first-order system on (x, v).
#[derive(Debug, Clone, Copy)]
pub struct DuffingField {
    pub params: DuffingParams,
}

impl DuffingField {
    pub fn new(params: DuffingParams) -> Self {
        Self { params }
    }

    /// Acceleration -δv - αx - βx³ + A·cos(φt).
    #[inline]
    pub fn acceleration(&self, t: f64, x: f64, v: f64) -> f64 {
        let p = &self.params;
        -p.delta * v - p.alpha * x - p.beta * x * x * x + self.forcing(t)
    }

    #[inline]
    pub fn forcing(&self, t: f64) -> f64 {
        self.params.amplitude * (self.params.frequency * t).cos()
    }

    /// Derivative (v, a) at a single phase-space point.
    pub fn derivative(&self, t: f64, x: f64, v: f64) -> (f64, f64) {
        (v, self.acceleration(t, x, v))
    }
}

impl DynamicalSystem for DuffingField {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = x[1];
        out[1] = self.acceleration(t, x[0], x[1]);
    }
}

/// Sampling window for the direction field overlay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DirectionFieldSpec {
    pub x_min: f64,
    pub x_max: f64,
    pub v_min: f64,
    pub v_max: f64,
    /// Samples per axis.
    pub resolution: usize,
    /// Time at which the forcing term is frozen.
    pub time: f64,
}

impl Default for DirectionFieldSpec {
    fn default() -> Self {
        Self {
            x_min: -2.0,
            x_max: 2.0,
            v_min: -2.0,
            v_max: 2.0,
            resolution: 20,
            time: 0.0,
        }
    }
}

/// Unit-length arrows of the vector field on a regular phase-space grid.
///
/// All vectors are stored row-major: row index follows v, column index follows x.
#[derive(Debug, Clone, Serialize)]
pub struct DirectionField {
    pub resolution: usize,
    pub x: Vec<f64>,
    pub v: Vec<f64>,
    pub dx: Vec<f64>,
    pub dv: Vec<f64>,
}

pub fn direction_field(params: DuffingParams, spec: &DirectionFieldSpec) -> DirectionField {
    let field = DuffingField::new(params);
    let xs = crate::grid::linspace(spec.x_min, spec.x_max, spec.resolution);
    let vs = crate::grid::linspace(spec.v_min, spec.v_max, spec.resolution);
    let cells = xs.len() * vs.len();

    let mut out = DirectionField {
        resolution: spec.resolution,
        x: Vec::with_capacity(cells),
        v: Vec::with_capacity(cells),
        dx: Vec::with_capacity(cells),
        dv: Vec::with_capacity(cells),
    };

    for &v in &vs {
        for &x in &xs {
            let (fx, fv) = field.derivative(spec.time, x, v);
            let norm = fx.hypot(fv);
            // Equilibria have no direction; keep the arrow at zero length.
            let (ux, uv) = if norm > 0.0 && norm.is_finite() {
                (fx / norm, fv / norm)
            } else {
                (0.0, 0.0)
            };
            out.x.push(x);
            out.v.push(v);
            out.dx.push(ux);
            out.dv.push(uv);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_matches_duffing_equation() {
        let field = DuffingField::new(DuffingParams::new(0.2, 1.0, 1.0, 0.3, 1.2));
        let mut out = [0.0; 2];
        field.apply(2.0, &[0.5, -1.5], &mut out);
        let expected = -0.2 * -1.5 - 0.5 - 0.125 + 0.3 * (2.4f64).cos();
        assert_eq!(out[0], -1.5);
        assert!((out[1] - expected).abs() < 1e-15);
    }

    #[test]
    fn zero_frequency_gives_constant_forcing() {
        let field = DuffingField::new(DuffingParams::new(0.0, 0.0, 0.0, 0.7, 0.0));
        for t in [0.0, 1.0, 123.4] {
            assert_eq!(field.forcing(t), 0.7);
        }
    }

    #[test]
    fn direction_field_arrows_are_unit_or_zero() {
        let params = DuffingParams::new(0.1, 1.0, 1.0, 0.0, 0.0);
        let spec = DirectionFieldSpec {
            resolution: 3,
            ..DirectionFieldSpec::default()
        };
        let arrows = direction_field(params, &spec);
        assert_eq!(arrows.x.len(), 9);

        for i in 0..arrows.x.len() {
            let len = arrows.dx[i].hypot(arrows.dv[i]);
            if arrows.x[i] == 0.0 && arrows.v[i] == 0.0 {
                assert_eq!(len, 0.0, "origin is an equilibrium of the unforced field");
            } else {
                assert!((len - 1.0).abs() < 1e-12);
            }
        }
        // Row-major over v: first row is v = -2.
        assert_eq!(&arrows.v[..3], &[-2.0, -2.0, -2.0]);
        assert_eq!(&arrows.x[..3], &[-2.0, 0.0, 2.0]);
    }
}
