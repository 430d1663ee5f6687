//! Output time grids and parameter ranges.

use crate::error::{DuffingError, Result};
use serde::{Deserialize, Serialize};

/// `n` evenly spaced samples over [start, end], both endpoints included exactly.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = end;
            values
        }
    }
}

/// Uniform time grid description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub t_start: f64,
    pub t_end: f64,
    pub num_points: usize,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            t_end: 50.0,
            num_points: 2000,
        }
    }
}

impl GridSpec {
    pub fn build(&self) -> Result<TimeGrid> {
        if self.num_points < 2 {
            return Err(DuffingError::invalid_grid(format!(
                "uniform grid needs at least 2 points, got {}",
                self.num_points
            )));
        }
        TimeGrid::explicit(linspace(self.t_start, self.t_end, self.num_points))
    }
}

/// Strictly increasing sequence of output times.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// Wraps explicit instants. An empty list is allowed.
    pub fn explicit(times: Vec<f64>) -> Result<Self> {
        if let Some(bad) = times.iter().position(|t| !t.is_finite()) {
            return Err(DuffingError::invalid_grid(format!(
                "time at index {bad} is not finite"
            )));
        }
        if let Some(idx) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DuffingError::invalid_grid(format!(
                "times must be strictly increasing (index {} -> {})",
                idx,
                idx + 1
            )));
        }
        Ok(Self { times })
    }

    pub fn uniform(t_start: f64, t_end: f64, num_points: usize) -> Result<Self> {
        GridSpec {
            t_start,
            t_end,
            num_points,
        }
        .build()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Uniformly sampled interval of a swept parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub start: f64,
    pub end: f64,
    pub samples: usize,
}

impl ParameterRange {
    pub const fn new(start: f64, end: f64, samples: usize) -> Self {
        Self {
            start,
            end,
            samples,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_endpoints() {
        let values = linspace(0.1, 5.0, 30);
        assert_eq!(values.len(), 30);
        assert_eq!(values[0], 0.1);
        assert_eq!(values[29], 5.0);
        assert!(linspace(1.0, 2.0, 0).is_empty());
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }

    #[test]
    fn default_grid_spans_zero_to_fifty() {
        let grid = GridSpec::default().build().expect("default grid is valid");
        assert_eq!(grid.len(), 2000);
        assert_eq!(grid.times()[0], 0.0);
        assert_eq!(grid.times()[1999], 50.0);
        assert!(grid.times().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn rejects_non_increasing_or_degenerate_grids() {
        let err = TimeGrid::explicit(vec![0.0, 1.0, 1.0]).expect_err("duplicate time");
        assert!(err.to_string().contains("strictly increasing"));

        let err = TimeGrid::explicit(vec![0.0, f64::NAN]).expect_err("nan time");
        assert!(err.to_string().contains("not finite"));

        let err = TimeGrid::uniform(0.0, 1.0, 1).expect_err("single point");
        assert!(err.to_string().contains("at least 2 points"));

        let err = TimeGrid::uniform(1.0, 1.0, 10).expect_err("zero span");
        assert!(err.to_string().contains("strictly increasing"));

        assert!(TimeGrid::explicit(Vec::new()).expect("empty grid").is_empty());
    }
}
