use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in our phase-space buffers.
/// Must support floating-point arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A separable Hamiltonian system advanced through caller-defined drift and
/// kick maps acting on a single packed phase-space buffer.
///
/// The drift updates the position-like components from the current momenta;
/// the kick updates the momentum-like components from the force evaluated at
/// time `t`. Any model parameters live inside the implementing type.
pub trait SplitSystem<T: Scalar> {
    /// Returns the packed phase-space dimension.
    fn dimension(&self) -> usize;

    /// Advances the position components of `y` in place by a step `dt`.
    fn drift(&self, dt: T, y: &mut [T]);

    /// Advances the momentum components of `y` in place by a step `dt`,
    /// using the force evaluated at time `t`.
    fn kick(&self, dt: T, t: T, y: &mut [T]);

    /// Per-dimension magnitude estimate entering the tolerance scale
    /// `atol + rtol * scale` used by the step-size search.
    fn tol_scale(&self, y: &[T], out: &mut [T]) {
        for i in 0..y.len() {
            out[i] = y[i].abs();
        }
    }

    /// Signed per-dimension distance between two phase-space positions.
    /// Override for coordinates where a plain difference is wrong
    /// (e.g. angular components).
    fn metric(&self, a: &[T], b: &[T], out: &mut [T]) {
        for i in 0..a.len() {
            out[i] = a[i] - b[i];
        }
    }
}

/// A Hamiltonian system described by its acceleration field, used by the
/// sixth-order path which keeps positions and momenta in separate buffers.
pub trait ForceSystem<T: Scalar> {
    /// Returns the configuration-space dimension (half the phase space).
    fn dimension(&self) -> usize;

    /// Evaluates the acceleration at time `t` and position `q` into `out`.
    fn acceleration(&self, t: T, q: &[T], out: &mut [T]);
}
