//! Parameter sweeps: bifurcation scatter and steady-state amplitude surface.

use crate::error::{DuffingError, Result};
use crate::grid::{GridSpec, ParameterRange};
use crate::integrator::{solve_single_on, IntegratorSettings};
use crate::params::DuffingParams;
use crate::poincare::{poincare_section_with, stroboscopic_instants, PoincareSection, SectionSettings};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Forcing amplitudes of the reference bifurcation diagram.
pub const DEFAULT_AMPLITUDE_RANGE: ParameterRange = ParameterRange::new(0.0, 2.0, 300);
pub const DEFAULT_FREQUENCY_RANGE: ParameterRange = ParameterRange::new(0.1, 5.0, 30);
pub const DEFAULT_BETA_RANGE: ParameterRange = ParameterRange::new(-2.0, 2.0, 30);

fn map_samples<I, T, F>(items: &[I], f: F) -> Vec<T>
where
    I: Copy + Sync,
    T: Send,
    F: Fn(I) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        items.par_iter().map(|&item| f(item)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(|&item| f(item)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BifurcationSettings {
    pub section: SectionSettings,
    /// Start each sample from the last section state of the previous one instead
    /// of resetting to `section.initial_state`. Forces a sequential sweep.
    pub continuation: bool,
}

/// Scatter of (A, x) pairs, one per stroboscopic instant per amplitude sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BifurcationDiagram {
    pub parameter: Vec<f64>,
    pub x: Vec<f64>,
    /// Amplitudes whose integration diverged and contributed no points.
    pub failed: Vec<f64>,
}

impl BifurcationDiagram {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn absorb(&mut self, amplitude: f64, outcome: Result<PoincareSection>) {
        match outcome {
            Ok(section) => {
                self.parameter
                    .extend(std::iter::repeat(amplitude).take(section.len()));
                self.x.extend(section.x);
            }
            Err(err) => {
                warn!(amplitude, error = %err, "skipping bifurcation sample");
                self.failed.push(amplitude);
            }
        }
    }
}

pub fn bifurcation_sweep(params: DuffingParams, a_range: ParameterRange) -> Result<BifurcationDiagram> {
    bifurcation_sweep_with(params, a_range, &BifurcationSettings::default())
}

/// Sweeps the forcing amplitude over `a_range`, collecting Poincare x-values.
pub fn bifurcation_sweep_with(
    params: DuffingParams,
    a_range: ParameterRange,
    settings: &BifurcationSettings,
) -> Result<BifurcationDiagram> {
    if params.forcing_period().is_none() {
        return Err(DuffingError::unforced("Bifurcation diagram"));
    }
    let instants = stroboscopic_instants(
        params.frequency,
        settings.section.horizon,
        settings.section.integrator.max_steps,
    )?;
    let amplitudes = a_range.values();
    debug!(
        samples = amplitudes.len(),
        instants = instants.len(),
        continuation = settings.continuation,
        "starting bifurcation sweep"
    );

    let mut diagram = BifurcationDiagram {
        parameter: Vec::with_capacity(amplitudes.len() * instants.len()),
        x: Vec::with_capacity(amplitudes.len() * instants.len()),
        failed: Vec::new(),
    };

    if settings.continuation {
        let mut section_settings = settings.section;
        for &amplitude in &amplitudes {
            let outcome = poincare_section_with(params.with_amplitude(amplitude), &section_settings);
            if let Ok(section) = &outcome {
                if let (Some(&x), Some(&v)) = (section.x.last(), section.v.last()) {
                    section_settings.initial_state = [x, v];
                }
            }
            diagram.absorb(amplitude, outcome);
        }
    } else {
        let outcomes = map_samples(&amplitudes, |amplitude| {
            poincare_section_with(params.with_amplitude(amplitude), &settings.section)
        });
        for (&amplitude, outcome) in amplitudes.iter().zip(outcomes) {
            diagram.absorb(amplitude, outcome);
        }
    }

    Ok(diagram)
}

/// Configuration of the steady-state amplitude surface.
///
/// The amplitude is max |x| over the trailing `window` samples, which assumes
/// transients have decayed by then. For lightly damped or chaotic regions it is
/// an estimate, not an equilibrium amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSettings {
    pub grid: GridSpec,
    pub initial_state: [f64; 2],
    pub window: usize,
    pub integrator: IntegratorSettings,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            grid: GridSpec::default(),
            initial_state: [1.0, 2.0],
            window: 200,
            integrator: IntegratorSettings::default(),
        }
    }
}

/// Amplitudes on the (φ, β) grid: row i is `phi[i]`, column j is `beta[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeSurface {
    pub phi: Vec<f64>,
    pub beta: Vec<f64>,
    pub amplitude: DMatrix<f64>,
    /// Cells whose integration diverged; they hold NaN.
    pub failed_cells: usize,
}

impl AmplitudeSurface {
    pub fn shape(&self) -> (usize, usize) {
        self.amplitude.shape()
    }

    pub fn get(&self, phi_index: usize, beta_index: usize) -> f64 {
        self.amplitude[(phi_index, beta_index)]
    }
}

/// Largest |x| over the last `window` samples (the whole series if shorter).
pub fn tail_amplitude(x: &[f64], window: usize) -> f64 {
    let start = x.len().saturating_sub(window.max(1));
    x[start..].iter().fold(0.0_f64, |acc, value| acc.max(value.abs()))
}

pub fn amplitude_surface(
    params: DuffingParams,
    phi_range: ParameterRange,
    beta_range: ParameterRange,
) -> Result<AmplitudeSurface> {
    amplitude_surface_with(params, phi_range, beta_range, &SurfaceSettings::default())
}

/// Integrates one trajectory per (φ, β) cell with δ, α and A held fixed.
pub fn amplitude_surface_with(
    params: DuffingParams,
    phi_range: ParameterRange,
    beta_range: ParameterRange,
    settings: &SurfaceSettings,
) -> Result<AmplitudeSurface> {
    let grid = settings.grid.build()?;
    let phi = phi_range.values();
    let beta = beta_range.values();
    let (rows, cols) = (phi.len(), beta.len());
    debug!(rows, cols, window = settings.window, "starting amplitude surface");

    let cells: Vec<(usize, usize)> = (0..rows)
        .flat_map(|i| (0..cols).map(move |j| (i, j)))
        .collect();
    let values = map_samples(&cells, |(i, j)| {
        let cell_params = params.with_frequency(phi[i]).with_beta(beta[j]);
        match solve_single_on(cell_params, settings.initial_state, &grid, &settings.integrator) {
            Ok(trajectory) => tail_amplitude(&trajectory.x, settings.window),
            Err(err) => {
                warn!(phi = phi[i], beta = beta[j], error = %err, "amplitude cell diverged");
                f64::NAN
            }
        }
    });

    let failed_cells = values.iter().filter(|value| value.is_nan()).count();
    Ok(AmplitudeSurface {
        amplitude: DMatrix::from_row_slice(rows, cols, &values),
        phi,
        beta,
        failed_cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bifurcation_requires_forcing() {
        let params = DuffingParams::default().with_frequency(0.0);
        let err = bifurcation_sweep(params, DEFAULT_AMPLITUDE_RANGE).expect_err("unforced");
        assert!(err.is_unavailable());
        assert!(err.to_string().starts_with("Bifurcation diagram unavailable"));
    }

    #[test]
    fn bifurcation_point_count_is_samples_times_instants() {
        let params = DuffingParams::new(0.3, -1.0, 1.0, 0.0, 1.2);
        let range = ParameterRange::new(0.0, 0.5, 6);
        let diagram = bifurcation_sweep(params, range).expect("forced sweep");
        let instants = stroboscopic_instants(1.2, 50.0, 1_000).expect("forced").len();

        assert!(diagram.failed.is_empty());
        assert_eq!(diagram.len(), 6 * instants);
        assert_eq!(diagram.parameter.len(), diagram.x.len());

        // Each amplitude block equals the standalone section for that amplitude.
        for (block, amplitude) in range.values().into_iter().enumerate() {
            let section = poincare_section_with(
                params.with_amplitude(amplitude),
                &SectionSettings::default(),
            )
            .expect("section");
            let span = block * instants..(block + 1) * instants;
            assert!(diagram.parameter[span.clone()].iter().all(|&a| a == amplitude));
            assert_eq!(&diagram.x[span], section.x.as_slice());
        }
    }

    #[test]
    fn oversized_section_aborts_the_sweep_with_an_error() {
        let params = DuffingParams::default().with_frequency(1e13);
        let err = bifurcation_sweep(params, ParameterRange::new(0.0, 1.0, 3)).expect_err("budget");
        assert!(matches!(err, DuffingError::InvalidTimeGrid { .. }));
    }

    #[test]
    fn escaping_samples_are_recorded_as_failed() {
        // Undamped softening spring: every orbit from (1, 0) escapes to infinity.
        let params = DuffingParams::new(0.0, 1.0, -2.0, 0.0, 1.2);
        let range = ParameterRange::new(0.0, 1.0, 3);
        for continuation in [false, true] {
            let settings = BifurcationSettings {
                continuation,
                ..BifurcationSettings::default()
            };
            let diagram = bifurcation_sweep_with(params, range, &settings).expect("forced sweep");
            assert!(diagram.is_empty());
            assert!(diagram.parameter.is_empty());
            assert_eq!(diagram.failed, vec![0.0, 0.5, 1.0]);
        }
    }

    #[test]
    fn long_period_sweep_is_empty_not_an_error() {
        let params = DuffingParams::default().with_frequency(0.1);
        let diagram = bifurcation_sweep(params, ParameterRange::new(0.0, 1.0, 4)).expect("forced");
        assert!(diagram.is_empty());
        assert!(diagram.failed.is_empty());
    }

    #[test]
    fn continuation_threads_the_final_state_forward() {
        let params = DuffingParams::new(0.3, -1.0, 1.0, 0.0, 1.2);
        let range = ParameterRange::new(0.2, 0.4, 3);
        let settings = BifurcationSettings {
            continuation: true,
            ..BifurcationSettings::default()
        };
        let diagram = bifurcation_sweep_with(params, range, &settings).expect("forced sweep");
        let instants = stroboscopic_instants(1.2, 50.0, 1_000).expect("forced").len();
        assert_eq!(diagram.len(), 3 * instants);

        // The first sample of block 1 is the last sample of block 0.
        assert_eq!(diagram.x[instants], diagram.x[instants - 1]);
        // Reset mode always starts at x = 1.
        assert_eq!(diagram.x[0], 1.0);
    }

    #[test]
    fn tail_amplitude_uses_trailing_window() {
        let x = [5.0, -4.0, 0.5, -1.5, 1.0];
        assert_eq!(tail_amplitude(&x, 3), 1.5);
        assert_eq!(tail_amplitude(&x, 100), 5.0);
        assert_eq!(tail_amplitude(&x, 0), 1.0);
        assert_eq!(tail_amplitude(&[], 200), 0.0);
    }

    #[test]
    fn surface_shape_matches_ranges() {
        let params = DuffingParams::default();
        let settings = SurfaceSettings {
            grid: GridSpec {
                t_start: 0.0,
                t_end: 20.0,
                num_points: 400,
            },
            window: 50,
            ..SurfaceSettings::default()
        };
        let phi = ParameterRange::new(0.5, 2.0, 4);
        let beta = ParameterRange::new(0.0, 1.0, 3);
        let surface = amplitude_surface_with(params, phi, beta, &settings).expect("surface");

        assert_eq!(surface.shape(), (4, 3));
        assert_eq!(surface.phi, phi.values());
        assert_eq!(surface.beta, beta.values());
        assert_eq!(surface.failed_cells, 0);
        assert!(surface.amplitude.iter().all(|a| a.is_finite() && *a >= 0.0));
    }

    #[test]
    fn escaping_cells_are_nan_and_counted() {
        // beta = -2 escapes from (1, 2); beta = 1 stays bounded.
        let params = DuffingParams::new(0.0, 1.0, 1.0, 0.0, 1.2);
        let phi = ParameterRange::new(1.0, 2.0, 2);
        let beta = ParameterRange::new(-2.0, 1.0, 2);
        let surface = amplitude_surface(params, phi, beta).expect("surface");

        assert_eq!(surface.shape(), (2, 2));
        assert_eq!(surface.failed_cells, 2);
        for i in 0..2 {
            assert!(surface.get(i, 0).is_nan());
            assert!(surface.get(i, 1).is_finite());
        }
    }

    #[test]
    fn surface_cell_equals_direct_tail_amplitude() {
        let params = DuffingParams::default();
        let settings = SurfaceSettings::default();
        let phi = ParameterRange::new(1.0, 1.5, 2);
        let beta = ParameterRange::new(0.0, 0.5, 2);
        let surface = amplitude_surface_with(params, phi, beta, &settings).expect("surface");

        let grid = settings.grid.build().expect("grid");
        let trajectory = solve_single_on(
            params.with_frequency(1.5).with_beta(0.0),
            [1.0, 2.0],
            &grid,
            &settings.integrator,
        )
        .expect("trajectory");
        assert_eq!(surface.get(1, 0), tail_amplitude(&trajectory.x, 200));
    }
}
