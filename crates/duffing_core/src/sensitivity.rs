//! Sensitivity to initial conditions: a nominal run and two perturbed twins.

use crate::error::Result;
use crate::integrator::{solve_single, Trajectory};
use crate::params::DuffingParams;
use serde::Serialize;

/// Nominal initial condition shared by the single-oscillator views.
pub const NOMINAL_INITIAL_STATE: [f64; 2] = [1.0, 2.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityEnsemble {
    pub epsilon: f64,
    /// Run from (1, 2).
    pub nominal: Trajectory,
    /// Run from (1 + ε, 2 + ε).
    pub plus: Trajectory,
    /// Run from (1 - ε, 2 - ε).
    pub minus: Trajectory,
}

impl SensitivityEnsemble {
    /// Phase-space distance of the `plus` run from the nominal run at every sample.
    pub fn plus_separation(&self) -> Vec<f64> {
        separation(&self.nominal, &self.plus)
    }

    pub fn minus_separation(&self) -> Vec<f64> {
        separation(&self.nominal, &self.minus)
    }
}

fn separation(a: &Trajectory, b: &Trajectory) -> Vec<f64> {
    a.x.iter()
        .zip(&a.v)
        .zip(b.x.iter().zip(&b.v))
        .map(|((xa, va), (xb, vb))| (xa - xb).hypot(va - vb))
        .collect()
}

pub fn sensitivity_ensemble(params: DuffingParams, epsilon: f64) -> Result<SensitivityEnsemble> {
    let [x0, v0] = NOMINAL_INITIAL_STATE;
    Ok(SensitivityEnsemble {
        epsilon,
        nominal: solve_single(params, x0, v0)?,
        plus: solve_single(params, x0 + epsilon, v0 + epsilon)?,
        minus: solve_single(params, x0 - epsilon, v0 - epsilon)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DEFAULT_EPSILON;

    #[test]
    fn zero_epsilon_gives_identical_runs() {
        let ensemble = sensitivity_ensemble(DuffingParams::default(), 0.0).expect("runs");
        assert_eq!(ensemble.nominal, ensemble.plus);
        assert_eq!(ensemble.nominal, ensemble.minus);
        assert!(ensemble.plus_separation().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn perturbed_runs_start_at_the_offset_state() {
        let ensemble =
            sensitivity_ensemble(DuffingParams::default(), DEFAULT_EPSILON).expect("runs");
        assert_eq!(ensemble.plus.x[0], 1.0 + DEFAULT_EPSILON);
        assert_eq!(ensemble.minus.v[0], 2.0 - DEFAULT_EPSILON);

        let initial = ensemble.plus_separation()[0];
        assert!((initial - DEFAULT_EPSILON * std::f64::consts::SQRT_2).abs() < 1e-12);
        assert_eq!(ensemble.minus_separation().len(), ensemble.nominal.len());
    }

    #[test]
    fn damped_regime_forgets_the_perturbation() {
        // Strong damping with a unique periodic attractor: separations shrink.
        let params = DuffingParams::new(0.5, 1.0, 0.2, 0.3, 1.0);
        let ensemble = sensitivity_ensemble(params, 0.1).expect("runs");
        let separation = ensemble.plus_separation();
        assert!(separation[separation.len() - 1] < 1e-3 * separation[0]);
    }
}
