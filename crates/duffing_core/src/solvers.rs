use crate::traits::{DynamicalSystem, EmbeddedStepper};

const STAGES: usize = 13;

// Fehlberg 7(8) nodes.
const C: [f64; STAGES] = [
    0.0,
    2.0 / 27.0,
    1.0 / 9.0,
    1.0 / 6.0,
    5.0 / 12.0,
    1.0 / 2.0,
    5.0 / 6.0,
    1.0 / 6.0,
    2.0 / 3.0,
    1.0 / 3.0,
    1.0,
    0.0,
    1.0,
];

// Lower-triangular Runge-Kutta matrix, row i holds a[i][0..i].
const A: [[f64; STAGES - 1]; STAGES] = [
    [0.0; 12],
    [2.0 / 27.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 36.0, 1.0 / 12.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 24.0, 0.0, 1.0 / 8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [5.0 / 12.0, 0.0, -25.0 / 16.0, 25.0 / 16.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 20.0, 0.0, 0.0, 1.0 / 4.0, 1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [
        -25.0 / 108.0,
        0.0,
        0.0,
        125.0 / 108.0,
        -65.0 / 27.0,
        125.0 / 54.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        31.0 / 300.0,
        0.0,
        0.0,
        0.0,
        61.0 / 225.0,
        -2.0 / 9.0,
        13.0 / 900.0,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        2.0,
        0.0,
        0.0,
        -53.0 / 6.0,
        704.0 / 45.0,
        -107.0 / 9.0,
        67.0 / 90.0,
        3.0,
        0.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        -91.0 / 108.0,
        0.0,
        0.0,
        23.0 / 108.0,
        -976.0 / 135.0,
        311.0 / 54.0,
        -19.0 / 60.0,
        17.0 / 6.0,
        -1.0 / 12.0,
        0.0,
        0.0,
        0.0,
    ],
    [
        2383.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -301.0 / 82.0,
        2133.0 / 4100.0,
        45.0 / 82.0,
        45.0 / 164.0,
        18.0 / 41.0,
        0.0,
        0.0,
    ],
    [
        3.0 / 205.0,
        0.0,
        0.0,
        0.0,
        0.0,
        -6.0 / 41.0,
        -3.0 / 205.0,
        -3.0 / 41.0,
        3.0 / 41.0,
        6.0 / 41.0,
        0.0,
        0.0,
    ],
    [
        -1777.0 / 4100.0,
        0.0,
        0.0,
        -341.0 / 164.0,
        4496.0 / 1025.0,
        -289.0 / 82.0,
        2193.0 / 4100.0,
        51.0 / 82.0,
        33.0 / 164.0,
        12.0 / 41.0,
        0.0,
        1.0,
    ],
];

// 8th order weights (propagated solution).
const B8: [f64; STAGES] = [
    0.0,
    0.0,
    0.0,
    0.0,
    0.0,
    34.0 / 105.0,
    9.0 / 35.0,
    9.0 / 35.0,
    9.0 / 280.0,
    9.0 / 280.0,
    0.0,
    41.0 / 840.0,
    41.0 / 840.0,
];

// b8 - b7 only differs in stages 1, 11, 12 and 13.
const ERR_WEIGHT: f64 = 41.0 / 840.0;

/// Runge-Kutta-Fehlberg 7(8) embedded pair with local extrapolation.
pub struct Rkf78 {
    k: Vec<Vec<f64>>,
    tmp: Vec<f64>,
    /// Number of right-hand-side evaluations performed so far.
    pub evaluations: usize,
}

impl Rkf78 {
    pub fn new(dim: usize) -> Self {
        Self {
            k: vec![vec![0.0; dim]; STAGES],
            tmp: vec![0.0; dim],
            evaluations: 0,
        }
    }
}

impl EmbeddedStepper for Rkf78 {
    fn order(&self) -> u32 {
        8
    }

    fn attempt(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        state: &[f64],
        dt: f64,
        out: &mut [f64],
        err: &mut [f64],
    ) {
        let n = state.len();

        system.apply(t, state, &mut self.k[0]);

        for stage in 1..STAGES {
            let row = &A[stage];
            for i in 0..n {
                let mut acc = 0.0;
                for (j, &a) in row[..stage].iter().enumerate() {
                    if a != 0.0 {
                        acc += a * self.k[j][i];
                    }
                }
                self.tmp[i] = state[i] + dt * acc;
            }
            system.apply(t + C[stage] * dt, &self.tmp, &mut self.k[stage]);
        }
        self.evaluations += STAGES;

        for i in 0..n {
            let mut acc = 0.0;
            for (j, &b) in B8.iter().enumerate() {
                if b != 0.0 {
                    acc += b * self.k[j][i];
                }
            }
            out[i] = state[i] + dt * acc;
            err[i] = dt * ERR_WEIGHT * (self.k[0][i] + self.k[10][i] - self.k[11][i] - self.k[12][i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decay;

    impl DynamicalSystem for Decay {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = -x[0];
        }
    }

    struct Clock;

    impl DynamicalSystem for Clock {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, t: f64, _x: &[f64], out: &mut [f64]) {
            out[0] = t.powi(7);
        }
    }

    #[test]
    fn tableau_rows_sum_to_nodes() {
        for (row, &c) in A.iter().zip(C.iter()) {
            let sum: f64 = row.iter().sum();
            assert!((sum - c).abs() < 1e-14, "row sum {sum} != node {c}");
        }
        let weights: f64 = B8.iter().sum();
        assert!((weights - 1.0).abs() < 1e-14);
    }

    #[test]
    fn single_step_matches_exponential_decay() {
        let mut stepper = Rkf78::new(1);
        let mut out = [0.0];
        let mut err = [0.0];
        stepper.attempt(&Decay, 0.0, &[1.0], 0.1, &mut out, &mut err);
        assert!((out[0] - (-0.1f64).exp()).abs() < 1e-13);
        assert!(err[0].abs() < 1e-10);
        assert_eq!(stepper.evaluations, STAGES);
    }

    #[test]
    fn integrates_degree_seven_polynomial_exactly() {
        let mut stepper = Rkf78::new(1);
        let mut out = [0.0];
        let mut err = [0.0];
        stepper.attempt(&Clock, 0.0, &[0.0], 1.0, &mut out, &mut err);
        assert!((out[0] - 1.0 / 8.0).abs() < 1e-13);
    }
}
