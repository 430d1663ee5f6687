//! The `duffing_core` crate is the numerical engine behind the Duffing oscillator
//! explorer. Every entry point is a one-shot, side-effect-free computation over a
//! fixed time grid; only the network noise draws are random.
//!
//! Key components:
//! - **Traits**: `DynamicalSystem` (vector fields), `EmbeddedStepper` (adaptive pairs).
//! - **Field**: the Duffing vector field and a normalized direction field.
//! - **Solvers / Integrator**: Runge-Kutta-Fehlberg 7(8) with step-size control,
//!   reporting exactly on the requested output times.
//! - **Poincare / Sweep**: stroboscopic sections, bifurcation scatter, amplitude surface.
//! - **Recurrence**: thresholded pairwise-distance matrices.
//! - **Network**: mean-field coupled oscillators with injectable noise.
pub mod error;
pub mod field;
pub mod grid;
pub mod integrator;
pub mod network;
pub mod params;
pub mod poincare;
pub mod recurrence;
pub mod sensitivity;
pub mod solvers;
pub mod sweep;
pub mod traits;

pub use error::{DuffingError, Result};
pub use integrator::{solve_single, Trajectory};
pub use network::{solve_network, NetworkTrajectory};
pub use params::DuffingParams;
pub use poincare::{poincare_section, PoincareSection};
pub use recurrence::{recurrence_matrix, RecurrenceMatrix};
pub use sweep::{amplitude_surface, bifurcation_sweep, AmplitudeSurface, BifurcationDiagram};
