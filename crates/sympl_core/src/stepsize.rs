use crate::steppers::{SplitScheme, Symplec6};
use crate::traits::{ForceSystem, Scalar, SplitSystem};
use serde::{Deserialize, Serialize};

/// Hard halving budget: the search gives up once the nominal interval over
/// the trial step reaches this ratio.
pub const MAX_DT_REDUCE: f64 = 10_000.0;

/// Relative/absolute error budget for the step-size search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tolerances<T> {
    pub rtol: T,
    pub atol: T,
}

impl<T: Scalar> Tolerances<T> {
    pub fn new(rtol: T, atol: T) -> Self {
        Self { rtol, atol }
    }
}

impl<T: Scalar> Default for Tolerances<T> {
    fn default() -> Self {
        Self {
            rtol: T::from_f64(1.49012e-12).unwrap(),
            atol: T::from_f64(1.49012e-12).unwrap(),
        }
    }
}

/// Outcome of the doubling/halving step-size search.
///
/// `tolerance_met` is false when the halving budget ran out before the
/// normalized discrepancy dropped to one; `dt` is then the best step found
/// and integration proceeds with it regardless.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepEstimate<T> {
    pub dt: T,
    pub tolerance_met: bool,
}

/// Searches for the largest sub-step of the chosen packed-layout scheme
/// whose one-step trajectory agrees with two half-steps to within the
/// tolerance scale, by repeated halving from twice the nominal interval.
///
/// The trial steps drive the scheme's own interval sequence (one sub-step
/// against two, including the merged boundary drift), so the discrepancy
/// reflects the true composition. The tolerance scale is frozen from the
/// initial state before the search.
pub fn estimate_step_split<T: Scalar, S: SplitSystem<T>>(
    scheme: SplitScheme,
    system: &S,
    y0: &[T],
    t0: T,
    interval: T,
    tol: &Tolerances<T>,
) -> StepEstimate<T> {
    let dim = y0.len();
    let one = T::one();
    let two = T::from_f64(2.0).unwrap();
    let max_reduce = T::from_f64(MAX_DT_REDUCE).unwrap();

    let mut scaling = vec![T::zero(); dim];
    system.tol_scale(y0, &mut scaling);
    let mut scale2 = vec![T::zero(); dim];
    for i in 0..dim {
        let s = tol.atol + tol.rtol * scaling[i];
        scale2[i] = s * s;
    }

    let mut stepper = scheme.build();
    let mut y_full = vec![T::zero(); dim];
    let mut y_half = vec![T::zero(); dim];
    let mut delta = vec![T::zero(); dim];

    let mut err = two;
    let mut dt = interval * two;
    while err > one && interval / dt < max_reduce {
        dt = dt / two;
        y_full.copy_from_slice(y0);
        y_half.copy_from_slice(y0);
        let mut t = t0;
        stepper.advance_interval(system, &mut t, &mut y_full, dt, 1);
        let mut t = t0;
        stepper.advance_interval(system, &mut t, &mut y_half, dt / two, 2);
        system.metric(&y_full, &y_half, &mut delta);
        let mut acc = T::zero();
        for i in 0..dim {
            acc = acc + delta[i] * delta[i] / scale2[i];
        }
        err = (acc / T::from_usize(dim).unwrap()).sqrt();
    }

    StepEstimate {
        dt,
        tolerance_met: err <= one,
    }
}

/// Sixth-order variant of the step-size search, on split buffers.
///
/// No caller-supplied scaling or metric here: the scale is a single value
/// per half, `max(atol, rtol * max|q|)` (and likewise for `p`), and the
/// discrepancy is accumulated in log space so widely varying magnitudes
/// neither overflow nor underflow.
pub fn estimate_step_symplec6<T: Scalar, S: ForceSystem<T>>(
    system: &S,
    q0: &[T],
    p0: &[T],
    t0: T,
    interval: T,
    tol: &Tolerances<T>,
) -> StepEstimate<T> {
    let dim = q0.len();
    let one = T::one();
    let two = T::from_f64(2.0).unwrap();
    let max_reduce = T::from_f64(MAX_DT_REDUCE).unwrap();

    let ln_scale_q = tol.atol.max(tol.rtol * max_abs(q0)).ln();
    let ln_scale_p = tol.atol.max(tol.rtol * max_abs(p0)).ln();

    let mut stepper = Symplec6::new(dim);
    let mut q_full = vec![T::zero(); dim];
    let mut p_full = vec![T::zero(); dim];
    let mut q_half = vec![T::zero(); dim];
    let mut p_half = vec![T::zero(); dim];

    let mut err = two;
    let mut dt = interval * two;
    while err > one && interval / dt < max_reduce {
        dt = dt / two;
        q_full.copy_from_slice(q0);
        p_full.copy_from_slice(p0);
        q_half.copy_from_slice(q0);
        p_half.copy_from_slice(p0);
        let mut t = t0;
        stepper.advance_interval(system, &mut t, &mut q_full, &mut p_full, dt, 1);
        let mut t = t0;
        stepper.advance_interval(system, &mut t, &mut q_half, &mut p_half, dt / two, 2);

        let mut acc = T::zero();
        for i in 0..dim {
            let dq = (q_full[i] - q_half[i]).abs();
            let dp = (p_full[i] - p_half[i]).abs();
            acc = acc + (two * dq.ln() - two * ln_scale_q).exp();
            acc = acc + (two * dp.ln() - two * ln_scale_p).exp();
        }
        err = (acc / two / T::from_usize(dim).unwrap()).sqrt();
    }

    StepEstimate {
        dt,
        tolerance_met: err <= one,
    }
}

fn max_abs<T: Scalar>(values: &[T]) -> T {
    values.iter().fold(T::zero(), |m, v| m.max(v.abs()))
}
