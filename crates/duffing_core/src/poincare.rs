//! Stroboscopic sampling once per forcing period.

use crate::error::{DuffingError, Result};
use crate::field::DuffingField;
use crate::grid::{GridSpec, TimeGrid};
use crate::integrator::{integrate, IntegratorSettings};
use crate::params::DuffingParams;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Initial condition applied at the first stroboscopic instant.
pub const SECTION_INITIAL_STATE: [f64; 2] = [1.0, 0.0];

/// Configuration of a Poincare section run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionSettings {
    /// Simulation horizon; instants stop strictly before it.
    pub horizon: f64,
    pub initial_state: [f64; 2],
    pub integrator: IntegratorSettings,
}

impl Default for SectionSettings {
    fn default() -> Self {
        Self {
            horizon: GridSpec::default().t_end,
            initial_state: SECTION_INITIAL_STATE,
            integrator: IntegratorSettings::default(),
        }
    }
}

/// State of the oscillator at each multiple of the forcing period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoincareSection {
    pub x: Vec<f64>,
    pub v: Vec<f64>,
    pub t: Vec<f64>,
}

impl PoincareSection {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// A forcing period longer than the horizon leaves no instants to sample.
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Instants k*T for k = 1 .. floor(horizon / T) - 1.
///
/// Fails with `DegenerateParameter` when there is no forcing period, and with
/// `InvalidTimeGrid` when more than `max_instants` instants would be produced.
pub fn stroboscopic_instants(frequency: f64, horizon: f64, max_instants: usize) -> Result<Vec<f64>> {
    let period = DuffingParams::default()
        .with_frequency(frequency)
        .forcing_period()
        .ok_or_else(|| DuffingError::unforced("Stroboscopic sampling"))?;
    let periods = (horizon / period).floor();
    if periods.is_nan() || periods <= 1.0 {
        return Ok(Vec::new());
    }
    let count = periods - 1.0;
    if count > max_instants as f64 {
        return Err(DuffingError::invalid_grid(format!(
            "{count:e} stroboscopic instants before t = {horizon} exceed the limit of {max_instants}"
        )));
    }
    Ok((1..=count as usize).map(|k| k as f64 * period).collect())
}

/// Poincare section over the default horizon, starting from (1, 0) at the first instant.
pub fn poincare_section(params: DuffingParams) -> Result<PoincareSection> {
    poincare_section_with(params, &SectionSettings::default())
}

/// The number of instants is capped by `settings.integrator.max_steps`, since
/// each instant costs at least one step.
pub fn poincare_section_with(
    params: DuffingParams,
    settings: &SectionSettings,
) -> Result<PoincareSection> {
    if params.forcing_period().is_none() {
        return Err(DuffingError::unforced("Poincare section"));
    }
    let instants =
        stroboscopic_instants(params.frequency, settings.horizon, settings.integrator.max_steps)?;
    if instants.is_empty() {
        debug!(
            frequency = params.frequency,
            horizon = settings.horizon,
            "forcing period exceeds horizon; section is empty"
        );
        return Ok(PoincareSection::default());
    }

    let grid = TimeGrid::explicit(instants)?;
    let field = DuffingField::new(params);
    let solution = integrate(&field, &settings.initial_state, &grid, &settings.integrator)?;

    let mut components = solution.components.into_iter();
    Ok(PoincareSection {
        x: components.next().unwrap_or_default(),
        v: components.next().unwrap_or_default(),
        t: solution.times,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn zero_frequency_is_unavailable() {
        let params = DuffingParams::default().with_frequency(0.0);
        let err = poincare_section(params).expect_err("no forcing period");
        assert!(err.is_unavailable());
        assert!(err.to_string().starts_with("Poincare section unavailable"));
        let err = stroboscopic_instants(0.0, 50.0, 1_000).expect_err("no forcing period");
        assert!(err.is_unavailable());
    }

    #[test]
    fn instant_count_follows_floor_rule() {
        for frequency in [0.4, 1.0, 1.2, 2.5, 5.0] {
            let period = 2.0 * PI / frequency;
            let expected = (50.0 / period).floor() as usize - 1;
            let instants = stroboscopic_instants(frequency, 50.0, 1_000).expect("forced");
            assert_eq!(instants.len(), expected, "frequency {frequency}");
            for (k, t) in instants.iter().enumerate() {
                assert_eq!(*t, (k + 1) as f64 * period);
            }
            assert!(instants.last().map_or(true, |&t| t < 50.0));
        }
    }

    #[test]
    fn oversized_instant_count_is_an_error() {
        let err = stroboscopic_instants(1e13, 50.0, 1_000_000).expect_err("too many instants");
        assert!(matches!(err, DuffingError::InvalidTimeGrid { .. }));
        assert!(err.to_string().contains("exceed the limit"));

        let err = stroboscopic_instants(1.2, f64::INFINITY, 1_000).expect_err("unbounded horizon");
        assert!(matches!(err, DuffingError::InvalidTimeGrid { .. }));

        // Exactly at the limit is still fine: floor(50 / T) - 1 == 8 for phi = 1.2.
        assert_eq!(stroboscopic_instants(1.2, 50.0, 8).expect("at limit").len(), 8);
        assert!(stroboscopic_instants(1.2, 50.0, 7).is_err());
    }

    #[test]
    fn section_with_huge_frequency_fails_instead_of_aborting() {
        let params = DuffingParams::default().with_frequency(1e13);
        let err = poincare_section(params).expect_err("instant budget exceeded");
        assert!(matches!(err, DuffingError::InvalidTimeGrid { .. }));
        assert!(!err.is_unavailable());
    }

    #[test]
    fn long_period_yields_empty_section() {
        // T = 2*pi/0.1 ~ 62.8 > 50
        let params = DuffingParams::default().with_frequency(0.1);
        let section = poincare_section(params).expect("empty but available");
        assert!(section.is_empty());
        assert!(section.x.is_empty() && section.v.is_empty());

        // Between one and two periods fit: floor(...) - 1 == 0.
        let params = DuffingParams::default().with_frequency(0.15);
        assert!(poincare_section(params).expect("available").is_empty());
    }

    #[test]
    fn section_starts_from_reset_state_at_first_instant() {
        let params = DuffingParams::new(0.2, 1.0, 1.0, 0.3, 1.2);
        let section = poincare_section(params).expect("forced system");
        let expected = stroboscopic_instants(1.2, 50.0, 1_000).expect("forced");

        assert_eq!(section.t, expected);
        assert_eq!(section.len(), 8);
        assert_eq!(section.x[0], 1.0);
        assert_eq!(section.v[0], 0.0);
        assert!(section.x.iter().chain(&section.v).all(|value| value.is_finite()));
    }

    #[test]
    fn linear_response_settles_on_a_fixed_point() {
        // Strong damping: after transients the stroboscopic map is a fixed point.
        let params = DuffingParams::new(1.0, 1.0, 0.0, 0.5, 2.0);
        let settings = SectionSettings {
            horizon: 200.0,
            ..SectionSettings::default()
        };
        let section = poincare_section_with(params, &settings).expect("forced system");
        let n = section.len();
        assert!(n > 10);
        assert!((section.x[n - 1] - section.x[n - 2]).abs() < 1e-8);
        assert!((section.v[n - 1] - section.v[n - 2]).abs() < 1e-8);
    }
}
