//! The `sympl_core` crate advances Hamiltonian systems in time with
//! symplectic integrators, sampling the trajectory on an equally spaced
//! output grid. Per-step accuracy is traded for bounded long-term drift in
//! conserved quantities.
//!
//! Key components:
//! - **Traits**: `Scalar` (numeric type abstraction), `SplitSystem`
//!   (drift/kick splitting on a packed buffer), `ForceSystem`
//!   (acceleration field on split position/momentum buffers).
//! - **Steppers**: fixed-step compositions of orders 2 (`Leapfrog`),
//!   4 (`Symplec4`, Kinoshita) and 6 (`Symplec6`, Yoshida 1990).
//! - **Step-size search**: doubling/halving estimators matched to each
//!   scheme, with a hard halving budget.
//! - **Trajectory drivers**: per-scheme entry points with cooperative
//!   cancellation through `CancelToken`.
pub mod cancel;
pub mod kernels;
pub mod steppers;
pub mod stepsize;
pub mod traits;
pub mod trajectory;
