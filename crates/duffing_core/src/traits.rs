/// A continuous-time dynamical system dx/dt = f(t, x).
pub trait DynamicalSystem {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]);
}

impl<S: DynamicalSystem + ?Sized> DynamicalSystem for &S {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        (**self).apply(t, x, out)
    }
}

/// A trait for embedded Runge-Kutta pairs that can attempt one adaptive step.
pub trait EmbeddedStepper {
    /// Order of the propagated solution, used by the step-size controller.
    fn order(&self) -> u32;

    /// Attempts one step of size dt from (t, state).
    /// The candidate solution is written to `out` and the per-component
    /// local error estimate to `err`. Neither `state` nor `t` is modified.
    fn attempt(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        state: &[f64],
        dt: f64,
        out: &mut [f64],
        err: &mut [f64],
    );
}
