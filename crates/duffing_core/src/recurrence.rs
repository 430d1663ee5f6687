//! Recurrence plots of a single-oscillator trajectory.
//!
//! Memory and time are O(L²) in the trajectory length, so L should stay at a
//! few thousand samples (the default grid has 2000).

use crate::error::Result;
use crate::integrator::{solve_single, Trajectory};
use crate::params::DuffingParams;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceSettings {
    /// Threshold as a fraction of the largest pairwise distance.
    pub threshold_fraction: f64,
}

impl Default for RecurrenceSettings {
    fn default() -> Self {
        Self {
            threshold_fraction: 0.1,
        }
    }
}

/// Binary recurrence matrix with the threshold that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceMatrix {
    pub threshold: f64,
    pub max_distance: f64,
    pub matrix: DMatrix<u8>,
}

impl RecurrenceMatrix {
    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.matrix[(i, j)]
    }

    /// Fraction of ones in the matrix.
    pub fn recurrence_rate(&self) -> f64 {
        let n = self.matrix.len();
        if n == 0 {
            return 0.0;
        }
        self.matrix.iter().map(|&r| r as usize).sum::<usize>() as f64 / n as f64
    }

    /// Row-major copy, the layout renderers consume.
    pub fn to_row_major(&self) -> Vec<u8> {
        let n = self.size();
        let mut out = Vec::with_capacity(n * n);
        for row in self.matrix.row_iter() {
            out.extend(row.iter().copied());
        }
        out
    }
}

/// Euclidean distances between every pair of (x_k, v_k) states.
pub fn distance_matrix(x: &[f64], v: &[f64]) -> DMatrix<f64> {
    let n = x.len().min(v.len());
    let mut distances = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let d = (x[i] - x[j]).hypot(v[i] - v[j]);
            distances[(i, j)] = d;
            distances[(j, i)] = d;
        }
    }
    distances
}

/// Thresholds pairwise distances at `threshold_fraction * max(D)`, with strict `<`.
pub fn recurrence_from_states(
    x: &[f64],
    v: &[f64],
    settings: &RecurrenceSettings,
) -> RecurrenceMatrix {
    let distances = distance_matrix(x, v);
    let max_distance = distances
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0_f64, f64::max);
    let threshold = settings.threshold_fraction * max_distance;
    let matrix = distances.map(|d| u8::from(d < threshold));

    debug!(
        size = matrix.nrows(),
        max_distance, threshold, "recurrence matrix computed"
    );
    RecurrenceMatrix {
        threshold,
        max_distance,
        matrix,
    }
}

pub fn recurrence_from_trajectory(
    trajectory: &Trajectory,
    settings: &RecurrenceSettings,
) -> RecurrenceMatrix {
    recurrence_from_states(&trajectory.x, &trajectory.v, settings)
}

/// Recurrence matrix of the default trajectory from (1, 2).
pub fn recurrence_matrix(params: DuffingParams) -> Result<RecurrenceMatrix> {
    let trajectory = solve_single(params, 1.0, 2.0)?;
    Ok(recurrence_from_trajectory(
        &trajectory,
        &RecurrenceSettings::default(),
    ))
}
