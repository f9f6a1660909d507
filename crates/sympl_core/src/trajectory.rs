use crate::cancel::CancelToken;
use crate::kernels::{decode_lz, encode_lz, write_block, write_block_qp};
use crate::steppers::{SplitScheme, Symplec6};
use crate::stepsize::{estimate_step_split, estimate_step_symplec6, Tolerances};
use crate::traits::{ForceSystem, Scalar, SplitSystem};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Sub-step selection: a fixed size (must evenly divide the inter-output
/// spacing, not checked) or automatic estimation from the tolerances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum StepSize<T> {
    Auto,
    Fixed(T),
}

/// How an integration call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Completed,
    /// The cancellation token was observed set between output intervals.
    /// Blocks up to `Trajectory::written` are valid, the rest unwritten.
    Cancelled,
}

impl Outcome {
    /// The status code of the original C interface: 0 on completion,
    /// -10 on interrupt.
    pub fn legacy_code(self) -> i32 {
        match self {
            Outcome::Completed => 0,
            Outcome::Cancelled => -10,
        }
    }
}

/// Result of one integration call: `written` output blocks of `block_len`
/// scalars each, in increasing time order, block 0 being the initial state.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory<T> {
    pub block_len: usize,
    pub data: Vec<T>,
    pub written: usize,
    pub outcome: Outcome,
    /// The sub-step size actually used.
    pub step: T,
    /// False when the step-size search exhausted its halving budget and
    /// `step` is best-effort rather than tolerance-meeting. Always true
    /// for a caller-fixed step.
    pub step_tolerance_met: bool,
}

impl<T> Trajectory<T> {
    pub fn block(&self, index: usize) -> &[T] {
        &self.data[index * self.block_len..(index + 1) * self.block_len]
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

/// Integrates a packed-layout system (order 2 or 4) across the output grid
/// `t`, which must be strictly increasing and equally spaced (not checked;
/// unequal spacing silently produces wrong output). A fixed step that does
/// not divide the spacing is silently truncated to an integer number of
/// sub-steps.
///
/// `encode_angular_momentum` multiplies the third state component by the
/// first before integrating (cylindrical/polar Lz) and divides it back out
/// of every written block.
///
/// The token is polled once per output interval; on cancellation the call
/// returns early with the blocks computed so far. Hook the token up to
/// SIGINT with [`crate::cancel::SigintGuard`] if desired.
pub fn integrate_split<T: Scalar, S: SplitSystem<T>>(
    scheme: SplitScheme,
    system: &S,
    y0: &[T],
    t: &[T],
    step: StepSize<T>,
    tol: Tolerances<T>,
    encode_angular_momentum: bool,
    token: &CancelToken,
) -> Result<Trajectory<T>> {
    let dim = y0.len();
    if dim == 0 {
        bail!("Initial state must have positive dimension.");
    }
    if system.dimension() != dim {
        bail!(
            "State dimension mismatch. Expected {}, got {}.",
            system.dimension(),
            dim
        );
    }
    if t.len() < 2 {
        bail!("Output grid must contain at least two times.");
    }
    if encode_angular_momentum && dim < 3 {
        bail!("Angular-momentum encoding requires at least three state components.");
    }
    if let StepSize::Fixed(dt) = step {
        if dt <= T::zero() {
            bail!("Fixed step size must be positive.");
        }
    }

    let nt = t.len();
    let mut data = vec![T::zero(); nt * dim];
    let mut y = y0.to_vec();
    // Block 0 is saved before the encoding so the caller always sees the
    // velocity-like quantity.
    write_block(&y, &mut data[..dim]);
    if encode_angular_momentum {
        encode_lz(&mut y);
    }

    let interval = t[1] - t[0];
    let (dt, tolerance_met) = match step {
        StepSize::Fixed(dt) => (dt, true),
        StepSize::Auto => {
            let est = estimate_step_split(scheme, system, &y, t[0], interval, &tol);
            (est.dt, est.tolerance_met)
        }
    };
    let ndt = (interval / dt).to_usize().unwrap_or(0).max(1);

    let mut stepper = scheme.build();
    let mut to = t[0];
    let mut outcome = Outcome::Completed;
    let mut written = 1usize;
    for i in 1..nt {
        if token.poll() {
            outcome = Outcome::Cancelled;
            break;
        }
        stepper.advance_interval(system, &mut to, &mut y, dt, ndt);
        let block = &mut data[i * dim..(i + 1) * dim];
        write_block(&y, block);
        if encode_angular_momentum {
            decode_lz(block);
        }
        written += 1;
    }

    Ok(Trajectory {
        block_len: dim,
        data,
        written,
        outcome,
        step: dt,
        step_tolerance_met: tolerance_met,
    })
}

/// Integrates a force-described system with the sixth-order Yoshida
/// composition. `y0` packs positions then momenta (`2 * dim` scalars) and
/// each output block uses the same layout. Grid and step contracts are the
/// same as for [`integrate_split`].
pub fn integrate_symplec6<T: Scalar, S: ForceSystem<T>>(
    system: &S,
    y0: &[T],
    t: &[T],
    step: StepSize<T>,
    tol: Tolerances<T>,
    token: &CancelToken,
) -> Result<Trajectory<T>> {
    let dim = system.dimension();
    if dim == 0 {
        bail!("System must have positive dimension.");
    }
    if y0.len() != 2 * dim {
        bail!(
            "Initial state must pack positions then momenta. Expected {}, got {}.",
            2 * dim,
            y0.len()
        );
    }
    if t.len() < 2 {
        bail!("Output grid must contain at least two times.");
    }
    if let StepSize::Fixed(dt) = step {
        if dt <= T::zero() {
            bail!("Fixed step size must be positive.");
        }
    }

    let nt = t.len();
    let block_len = 2 * dim;
    let mut data = vec![T::zero(); nt * block_len];
    let mut q = y0[..dim].to_vec();
    let mut p = y0[dim..].to_vec();
    write_block_qp(&q, &p, &mut data[..block_len]);

    let interval = t[1] - t[0];
    let (dt, tolerance_met) = match step {
        StepSize::Fixed(dt) => (dt, true),
        StepSize::Auto => {
            let est = estimate_step_symplec6(system, &q, &p, t[0], interval, &tol);
            (est.dt, est.tolerance_met)
        }
    };
    let ndt = (interval / dt).to_usize().unwrap_or(0).max(1);

    let mut stepper = Symplec6::new(dim);
    let mut to = t[0];
    let mut outcome = Outcome::Completed;
    let mut written = 1usize;
    for i in 1..nt {
        if token.poll() {
            outcome = Outcome::Cancelled;
            break;
        }
        stepper.advance_interval(system, &mut to, &mut q, &mut p, dt, ndt);
        write_block_qp(&q, &p, &mut data[i * block_len..(i + 1) * block_len]);
        written += 1;
    }

    Ok(Trajectory {
        block_len,
        data,
        written,
        outcome,
        step: dt,
        step_tolerance_met: tolerance_met,
    })
}
