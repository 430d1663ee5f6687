//! Sections, sweeps, recurrence plots and phase-portrait helpers.

use crate::system::{core_error, to_js, WasmDuffing};
use anyhow::bail;
use duffing_core::field::{direction_field, DirectionFieldSpec};
use duffing_core::grid::ParameterRange;
use duffing_core::poincare::{poincare_section_with, stroboscopic_instants, SectionSettings};
use duffing_core::recurrence::{recurrence_from_trajectory, RecurrenceSettings};
use duffing_core::sensitivity::sensitivity_ensemble;
use duffing_core::sweep::{
    amplitude_surface_with, bifurcation_sweep_with, BifurcationSettings, SurfaceSettings,
};
use duffing_core::{AmplitudeSurface, RecurrenceMatrix};
use js_sys::Float64Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub(crate) fn checked_range(start: f64, end: f64, samples: u32) -> anyhow::Result<ParameterRange> {
    if !start.is_finite() || !end.is_finite() {
        bail!("Sweep bounds must be finite.");
    }
    if samples == 0 {
        bail!("Sweep needs at least one sample.");
    }
    Ok(ParameterRange::new(start, end, samples as usize))
}

#[derive(Serialize)]
pub(crate) struct SurfacePayload {
    phi: Vec<f64>,
    beta: Vec<f64>,
    /// amplitude[i][j] belongs to (phi[i], beta[j]).
    amplitude: Vec<Vec<f64>>,
    failed_cells: usize,
}

impl From<AmplitudeSurface> for SurfacePayload {
    fn from(surface: AmplitudeSurface) -> Self {
        let amplitude = surface
            .amplitude
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        Self {
            phi: surface.phi,
            beta: surface.beta,
            amplitude,
            failed_cells: surface.failed_cells,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct RecurrencePayload {
    size: usize,
    threshold: f64,
    max_distance: f64,
    recurrence_rate: f64,
    /// Row-major binary cells.
    cells: Vec<u8>,
}

impl From<RecurrenceMatrix> for RecurrencePayload {
    fn from(matrix: RecurrenceMatrix) -> Self {
        Self {
            size: matrix.size(),
            threshold: matrix.threshold,
            max_distance: matrix.max_distance,
            recurrence_rate: matrix.recurrence_rate(),
            cells: matrix.to_row_major(),
        }
    }
}

impl WasmDuffing {
    pub(crate) fn surface(
        &self,
        phi: ParameterRange,
        beta: ParameterRange,
        window: usize,
    ) -> anyhow::Result<SurfacePayload> {
        let settings = SurfaceSettings {
            window,
            integrator: self.integrator,
            ..SurfaceSettings::default()
        };
        let surface = amplitude_surface_with(self.params, phi, beta, &settings)?;
        Ok(surface.into())
    }

    pub(crate) fn recurrence(&self, threshold_fraction: f64) -> anyhow::Result<RecurrencePayload> {
        let trajectory = self.trajectory(1.0, 2.0)?;
        let matrix = recurrence_from_trajectory(
            &trajectory,
            &RecurrenceSettings { threshold_fraction },
        );
        Ok(matrix.into())
    }
}

#[wasm_bindgen]
impl WasmDuffing {
    /// Sample instants k·2π/φ before `horizon`; errors when φ = 0 or when the
    /// count exceeds the step budget.
    pub fn stroboscopic_instants(&self, horizon: f64) -> Result<Float64Array, JsValue> {
        let instants =
            stroboscopic_instants(self.params.frequency, horizon, self.integrator.max_steps)
                .map_err(core_error)?;
        Ok(Float64Array::from(instants.as_slice()))
    }

    /// Poincare section `{ x, v, t }`, possibly empty.
    pub fn poincare_section(&self) -> Result<JsValue, JsValue> {
        let settings = SectionSettings {
            integrator: self.integrator,
            ..SectionSettings::default()
        };
        let section = poincare_section_with(self.params, &settings).map_err(core_error)?;
        to_js(&section, "Poincare section")
    }

    /// Bifurcation scatter `{ parameter, x, failed }` over forcing amplitudes.
    pub fn bifurcation_sweep(
        &self,
        a_start: f64,
        a_end: f64,
        samples: u32,
        continuation: bool,
    ) -> Result<JsValue, JsValue> {
        let range = checked_range(a_start, a_end, samples)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mut settings = BifurcationSettings {
            continuation,
            ..BifurcationSettings::default()
        };
        settings.section.integrator = self.integrator;
        let diagram = bifurcation_sweep_with(self.params, range, &settings).map_err(core_error)?;
        to_js(&diagram, "bifurcation diagram")
    }

    #[allow(clippy::too_many_arguments)]
    pub fn amplitude_surface(
        &self,
        phi_start: f64,
        phi_end: f64,
        phi_samples: u32,
        beta_start: f64,
        beta_end: f64,
        beta_samples: u32,
        window: u32,
    ) -> Result<JsValue, JsValue> {
        let payload = checked_range(phi_start, phi_end, phi_samples)
            .and_then(|phi| {
                let beta = checked_range(beta_start, beta_end, beta_samples)?;
                self.surface(phi, beta, window as usize)
            })
            .map_err(|e| JsValue::from_str(&format!("Amplitude surface failed: {e}")))?;
        to_js(&payload, "amplitude surface")
    }

    /// Recurrence plot of the trajectory from (1, 2).
    pub fn recurrence_matrix(&self, threshold_fraction: f64) -> Result<JsValue, JsValue> {
        let payload = self
            .recurrence(threshold_fraction)
            .map_err(|e| JsValue::from_str(&format!("Recurrence plot failed: {e}")))?;
        to_js(&payload, "recurrence matrix")
    }

    /// Nominal and ±ε trajectories for the sensitivity views.
    pub fn sensitivity_ensemble(&self, epsilon: f64) -> Result<JsValue, JsValue> {
        let ensemble = sensitivity_ensemble(self.params, epsilon).map_err(core_error)?;
        to_js(&ensemble, "sensitivity ensemble")
    }

    /// Unit arrows of the vector field on a `resolution`² grid over [-2, 2]².
    pub fn direction_field(&self, resolution: u32, time: f64) -> Result<JsValue, JsValue> {
        let spec = DirectionFieldSpec {
            resolution: resolution as usize,
            time,
            ..DirectionFieldSpec::default()
        };
        to_js(&direction_field(self.params, &spec), "direction field")
    }
}
