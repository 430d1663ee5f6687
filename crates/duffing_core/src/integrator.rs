//! Adaptive integration of a dynamical system onto an output time grid.

use crate::error::{DuffingError, Result};
use crate::field::DuffingField;
use crate::grid::{GridSpec, TimeGrid};
use crate::params::DuffingParams;
use crate::solvers::Rkf78;
use crate::traits::{DynamicalSystem, EmbeddedStepper};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Tolerances and budgets of the adaptive solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSettings {
    pub rtol: f64,
    pub atol: f64,
    pub initial_step: f64,
    /// Upper bound on attempted steps (accepted + rejected) per integration.
    pub max_steps: usize,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-10,
            atol: 1e-10,
            initial_step: 1e-3,
            max_steps: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// Solution sampled on the output grid, stored component-major:
/// `components[i][k]` is state component i at `times[k]`.
#[derive(Debug, Clone)]
pub struct Solution {
    pub times: Vec<f64>,
    pub components: Vec<Vec<f64>>,
    pub stats: StepStats,
}

/// Integrates `system` from `initial_state` at `grid.times()[0]` and reports the
/// state at every grid instant. The first sample is the initial state itself.
pub fn integrate<S: DynamicalSystem>(
    system: &S,
    initial_state: &[f64],
    grid: &TimeGrid,
    settings: &IntegratorSettings,
) -> Result<Solution> {
    let dim = system.dimension();
    if initial_state.len() != dim {
        return Err(DuffingError::DimensionMismatch {
            expected: dim,
            actual: initial_state.len(),
        });
    }

    let times = grid.times();
    let mut components: Vec<Vec<f64>> = (0..dim).map(|_| Vec::with_capacity(times.len())).collect();
    let mut stats = StepStats::default();

    let Some(&t0) = times.first() else {
        return Ok(Solution {
            times: Vec::new(),
            components,
            stats,
        });
    };
    if !all_finite(initial_state) {
        return Err(DuffingError::divergence(t0, "initial state is not finite"));
    }

    let mut stepper = Rkf78::new(dim);
    let exponent = 1.0 / stepper.order() as f64;
    let mut y = initial_state.to_vec();
    let mut candidate = vec![0.0; dim];
    let mut err = vec![0.0; dim];
    let mut t = t0;
    let mut h = settings.initial_step.abs();
    if !(h > 0.0) || !h.is_finite() {
        h = IntegratorSettings::default().initial_step;
    }

    push_sample(&mut components, &y);

    for &target in &times[1..] {
        while t < target {
            if stats.accepted + stats.rejected >= settings.max_steps {
                return Err(DuffingError::divergence(
                    t,
                    format!("step budget of {} exhausted", settings.max_steps),
                ));
            }
            if h < min_step(t) {
                return Err(DuffingError::divergence(t, "step size underflow"));
            }

            let remaining = target - t;
            // Stretch slightly to avoid leaving a sliver before the output time.
            let clipped = h * 1.01 >= remaining;
            let dt = if clipped { remaining } else { h };

            stepper.attempt(system, t, &y, dt, &mut candidate, &mut err);
            let norm = error_norm(&y, &candidate, &err, settings);

            if norm.is_finite() && norm <= 1.0 && all_finite(&candidate) {
                t = if clipped { target } else { t + dt };
                y.copy_from_slice(&candidate);
                stats.accepted += 1;

                let factor = if norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * norm.powf(-exponent)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                let proposal = dt * factor;
                h = if clipped { h.max(proposal) } else { proposal };
            } else {
                stats.rejected += 1;
                let factor = if norm.is_finite() {
                    (SAFETY * norm.powf(-exponent)).clamp(MIN_FACTOR, 1.0)
                } else {
                    MIN_FACTOR
                };
                h = dt * factor;
            }
        }
        push_sample(&mut components, &y);
    }

    stats.evaluations = stepper.evaluations;
    debug!(
        dim,
        samples = times.len(),
        accepted = stats.accepted,
        rejected = stats.rejected,
        "integration finished"
    );

    Ok(Solution {
        times: times.to_vec(),
        components,
        stats,
    })
}

fn push_sample(components: &mut [Vec<f64>], y: &[f64]) {
    for (series, &value) in components.iter_mut().zip(y) {
        series.push(value);
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn min_step(t: f64) -> f64 {
    16.0 * f64::EPSILON * t.abs().max(1.0)
}

/// RMS of the local error scaled by the mixed absolute/relative tolerance.
fn error_norm(y: &[f64], candidate: &[f64], err: &[f64], settings: &IntegratorSettings) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let sum: f64 = y
        .iter()
        .zip(candidate)
        .zip(err)
        .map(|((&a, &b), &e)| {
            let scale = settings.atol + settings.rtol * a.abs().max(b.abs());
            let ratio = e / scale;
            ratio * ratio
        })
        .sum();
    (sum / y.len() as f64).sqrt()
}

/// Position/velocity time series of one oscillator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub x: Vec<f64>,
    pub v: Vec<f64>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    fn from_solution(solution: Solution) -> Self {
        let mut components = solution.components.into_iter();
        let x = components.next().unwrap_or_default();
        let v = components.next().unwrap_or_default();
        Self {
            t: solution.times,
            x,
            v,
        }
    }
}

/// Integrates a single oscillator from (x0, v0) over the default grid, t in [0, 50] with 2000 points.
pub fn solve_single(params: DuffingParams, x0: f64, v0: f64) -> Result<Trajectory> {
    let grid = GridSpec::default().build()?;
    solve_single_on(params, [x0, v0], &grid, &IntegratorSettings::default())
}

pub fn solve_single_on(
    params: DuffingParams,
    initial_state: [f64; 2],
    grid: &TimeGrid,
    settings: &IntegratorSettings,
) -> Result<Trajectory> {
    let field = DuffingField::new(params);
    let solution = integrate(&field, &initial_state, grid, settings)?;
    Ok(Trajectory::from_solution(solution))
}
