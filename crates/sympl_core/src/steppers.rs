use crate::kernels::{leap_p, leap_q};
use crate::traits::{ForceSystem, Scalar, SplitSystem};
use serde::{Deserialize, Serialize};

/// Fixed-step scheme selection for the packed-layout drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitScheme {
    /// Second-order Strang splitting ("leapfrog").
    Leapfrog,
    /// Fourth-order Kinoshita composition.
    Symplec4,
}

impl SplitScheme {
    pub(crate) fn build(self) -> SplitStepper {
        match self {
            SplitScheme::Leapfrog => SplitStepper::Leapfrog(Leapfrog),
            SplitScheme::Symplec4 => SplitStepper::Symplec4(Symplec4),
        }
    }
}

pub(crate) enum SplitStepper {
    Leapfrog(Leapfrog),
    Symplec4(Symplec4),
}

impl SplitStepper {
    pub(crate) fn advance_interval<T: Scalar>(
        &mut self,
        system: &impl SplitSystem<T>,
        t: &mut T,
        y: &mut [T],
        dt: T,
        ndt: usize,
    ) {
        match self {
            SplitStepper::Leapfrog(s) => s.advance_interval(system, t, y, dt, ndt),
            SplitStepper::Symplec4(s) => s.advance_interval(system, t, y, dt, ndt),
        }
    }
}

/// Second-order leapfrog stepper.
///
/// One output interval is `ndt` sub-steps of size `dt`, composed as a single
/// symmetric sequence: half-drift, `ndt - 1` times [kick, drift], one final
/// kick and half-drift. Adjacent half-drifts of the inner sub-steps are
/// folded into full drifts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Leapfrog;

impl Leapfrog {
    /// Advances `y` across one output interval, accumulating elapsed time
    /// into `t` by repeated addition of `dt`.
    pub fn advance_interval<T: Scalar>(
        &mut self,
        system: &impl SplitSystem<T>,
        t: &mut T,
        y: &mut [T],
        dt: T,
        ndt: usize,
    ) {
        let half = T::from_f64(0.5).unwrap();
        system.drift(dt * half, y);
        for _ in 1..ndt {
            system.kick(dt, *t + dt * half, y);
            system.drift(dt, y);
            *t = *t + dt;
        }
        system.kick(dt, *t + dt * half, y);
        system.drift(dt * half, y);
        *t = *t + dt;
    }
}

/// Fourth-order symplectic stepper (Kinoshita et al. composition).
///
/// Four drift weights and three kick weights with the symmetry c4 = c1,
/// c3 = c2, d3 = d1 (d4 = 0). At inner sub-step boundaries the trailing c4
/// drift of one period is merged with the leading c1 drift of the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct Symplec4;

impl Symplec4 {
    const C1: f64 = 0.6756035959798289;
    const C2: f64 = -0.1756035959798288;
    const C3: f64 = Symplec4::C2;
    const C4: f64 = Symplec4::C1;
    const C41: f64 = Symplec4::C4 + Symplec4::C1;
    const D1: f64 = 1.3512071919596578;
    const D2: f64 = -1.7024143839193153;
    const D3: f64 = Symplec4::D1;

    pub fn advance_interval<T: Scalar>(
        &mut self,
        system: &impl SplitSystem<T>,
        t: &mut T,
        y: &mut [T],
        dt: T,
        ndt: usize,
    ) {
        let c1 = T::from_f64(Self::C1).unwrap();
        let c2 = T::from_f64(Self::C2).unwrap();
        let c3 = T::from_f64(Self::C3).unwrap();
        let c4 = T::from_f64(Self::C4).unwrap();
        let c41 = T::from_f64(Self::C41).unwrap();
        let d1 = T::from_f64(Self::D1).unwrap();
        let d2 = T::from_f64(Self::D2).unwrap();
        let d3 = T::from_f64(Self::D3).unwrap();

        system.drift(c1 * dt, y);
        *t = *t + c1 * dt;
        for _ in 1..ndt {
            system.kick(d1 * dt, *t, y);
            system.drift(c2 * dt, y);
            *t = *t + c2 * dt;
            system.kick(d2 * dt, *t, y);
            system.drift(c3 * dt, y);
            *t = *t + c3 * dt;
            system.kick(d3 * dt, *t, y);
            // merged c4 + c1 drift across the sub-step boundary
            system.drift(c41 * dt, y);
            *t = *t + c41 * dt;
        }
        system.kick(d1 * dt, *t, y);
        system.drift(c2 * dt, y);
        *t = *t + c2 * dt;
        system.kick(d2 * dt, *t, y);
        system.drift(c3 * dt, y);
        *t = *t + c3 * dt;
        system.kick(d3 * dt, *t, y);
        system.drift(c4 * dt, y);
        *t = *t + c4 * dt;
    }
}

/// Sixth-order symplectic stepper (Yoshida 1990 composition).
///
/// Operates on separate position and momentum buffers with an acceleration
/// callback. Eight drift and seven kick weights, symmetric (c8 = c1, ...,
/// d7 = d1; d8 = 0). Each stage writes into a staging buffer to avoid
/// read/write aliasing, alternating between the caller's buffers and the
/// stepper's scratch.
pub struct Symplec6<T: Scalar> {
    q_stage: Vec<T>,
    p_stage: Vec<T>,
    accel: Vec<T>,
}

impl<T: Scalar> Symplec6<T> {
    const C1: f64 = 0.392256805238780;
    const C2: f64 = 0.510043411918458;
    const C3: f64 = -0.471053385409758;
    const C4: f64 = 0.687531682525198e-1;
    const D1: f64 = 0.784513610477560;
    const D2: f64 = 0.235573213359357;
    const D3: f64 = -0.117767998417887e1;
    const D4: f64 = 0.131518632068391e1;

    pub fn new(dim: usize) -> Self {
        let z = T::from_f64(0.0).unwrap();
        Self {
            q_stage: vec![z; dim],
            p_stage: vec![z; dim],
            accel: vec![z; dim],
        }
    }

    /// Advances `q`/`p` across one output interval of `ndt` sub-steps of
    /// size `dt`. On return the caller's buffers hold the new state.
    pub fn advance_interval(
        &mut self,
        system: &impl ForceSystem<T>,
        t: &mut T,
        q: &mut [T],
        p: &mut [T],
        dt: T,
        ndt: usize,
    ) {
        let c1 = T::from_f64(Self::C1).unwrap();
        let c2 = T::from_f64(Self::C2).unwrap();
        let c3 = T::from_f64(Self::C3).unwrap();
        let c4 = T::from_f64(Self::C4).unwrap();
        let c5 = c4;
        let c6 = c3;
        let c7 = c2;
        let c8 = c1;
        let c81 = T::from_f64(Self::C1 + Self::C1).unwrap();
        let d1 = T::from_f64(Self::D1).unwrap();
        let d2 = T::from_f64(Self::D2).unwrap();
        let d3 = T::from_f64(Self::D3).unwrap();
        let d4 = T::from_f64(Self::D4).unwrap();
        let d5 = d3;
        let d6 = d2;
        let d7 = d1;

        leap_q(q, p, c1 * dt, &mut self.q_stage);
        *t = *t + c1 * dt;
        for _ in 1..ndt {
            system.acceleration(*t, &self.q_stage, &mut self.accel);
            leap_p(p, d1 * dt, &self.accel, &mut self.p_stage);
            leap_q(&self.q_stage, &self.p_stage, c2 * dt, q);
            *t = *t + c2 * dt;
            system.acceleration(*t, q, &mut self.accel);
            leap_p(&self.p_stage, d2 * dt, &self.accel, p);
            leap_q(q, p, c3 * dt, &mut self.q_stage);
            *t = *t + c3 * dt;
            system.acceleration(*t, &self.q_stage, &mut self.accel);
            leap_p(p, d3 * dt, &self.accel, &mut self.p_stage);
            leap_q(&self.q_stage, &self.p_stage, c4 * dt, q);
            *t = *t + c4 * dt;
            system.acceleration(*t, q, &mut self.accel);
            leap_p(&self.p_stage, d4 * dt, &self.accel, p);
            leap_q(q, p, c5 * dt, &mut self.q_stage);
            *t = *t + c5 * dt;
            system.acceleration(*t, &self.q_stage, &mut self.accel);
            leap_p(p, d5 * dt, &self.accel, &mut self.p_stage);
            leap_q(&self.q_stage, &self.p_stage, c6 * dt, q);
            *t = *t + c6 * dt;
            system.acceleration(*t, q, &mut self.accel);
            leap_p(&self.p_stage, d6 * dt, &self.accel, p);
            leap_q(q, p, c7 * dt, &mut self.q_stage);
            *t = *t + c7 * dt;
            system.acceleration(*t, &self.q_stage, &mut self.accel);
            leap_p(p, d7 * dt, &self.accel, &mut self.p_stage);
            // merged c8 + c1 drift across the sub-step boundary
            leap_q(&self.q_stage, &self.p_stage, c81 * dt, q);
            *t = *t + c81 * dt;
            self.q_stage.copy_from_slice(q);
            p.copy_from_slice(&self.p_stage);
        }
        system.acceleration(*t, &self.q_stage, &mut self.accel);
        leap_p(p, d1 * dt, &self.accel, &mut self.p_stage);
        leap_q(&self.q_stage, &self.p_stage, c2 * dt, q);
        *t = *t + c2 * dt;
        system.acceleration(*t, q, &mut self.accel);
        leap_p(&self.p_stage, d2 * dt, &self.accel, p);
        leap_q(q, p, c3 * dt, &mut self.q_stage);
        *t = *t + c3 * dt;
        system.acceleration(*t, &self.q_stage, &mut self.accel);
        leap_p(p, d3 * dt, &self.accel, &mut self.p_stage);
        leap_q(&self.q_stage, &self.p_stage, c4 * dt, q);
        *t = *t + c4 * dt;
        system.acceleration(*t, q, &mut self.accel);
        leap_p(&self.p_stage, d4 * dt, &self.accel, p);
        leap_q(q, p, c5 * dt, &mut self.q_stage);
        *t = *t + c5 * dt;
        system.acceleration(*t, &self.q_stage, &mut self.accel);
        leap_p(p, d5 * dt, &self.accel, &mut self.p_stage);
        leap_q(&self.q_stage, &self.p_stage, c6 * dt, q);
        *t = *t + c6 * dt;
        system.acceleration(*t, q, &mut self.accel);
        leap_p(&self.p_stage, d6 * dt, &self.accel, p);
        leap_q(q, p, c7 * dt, &mut self.q_stage);
        *t = *t + c7 * dt;
        system.acceleration(*t, &self.q_stage, &mut self.accel);
        leap_p(p, d7 * dt, &self.accel, &mut self.p_stage);
        leap_q(&self.q_stage, &self.p_stage, c8 * dt, q);
        *t = *t + c8 * dt;
        // d8 = 0: the closing kick is skipped, p8 = p7
        p.copy_from_slice(&self.p_stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ForceSystem, SplitSystem};

    /// Unit harmonic oscillator on the packed layout y = [q, p].
    struct Oscillator;

    impl SplitSystem<f64> for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn drift(&self, dt: f64, y: &mut [f64]) {
            y[0] += dt * y[1];
        }

        fn kick(&self, dt: f64, _t: f64, y: &mut [f64]) {
            y[1] -= dt * y[0];
        }
    }

    /// The same oscillator on the split layout, for the sixth-order path.
    struct OscillatorForce;

    impl ForceSystem<f64> for OscillatorForce {
        fn dimension(&self) -> usize {
            1
        }

        fn acceleration(&self, _t: f64, q: &[f64], out: &mut [f64]) {
            out[0] = -q[0];
        }
    }

    #[test]
    fn kinoshita_weights_are_consistent() {
        let drift_sum = Symplec4::C1 + Symplec4::C2 + Symplec4::C3 + Symplec4::C4;
        let kick_sum = Symplec4::D1 + Symplec4::D2 + Symplec4::D3;
        assert!((drift_sum - 1.0).abs() < 1e-15);
        assert!((kick_sum - 1.0).abs() < 1e-15);
    }

    #[test]
    fn yoshida_weights_are_consistent() {
        let drift_sum = 2.0
            * (Symplec6::<f64>::C1
                + Symplec6::<f64>::C2
                + Symplec6::<f64>::C3
                + Symplec6::<f64>::C4);
        let kick_sum = 2.0
            * (Symplec6::<f64>::D1 + Symplec6::<f64>::D2 + Symplec6::<f64>::D3)
            + Symplec6::<f64>::D4;
        assert!((drift_sum - 1.0).abs() < 1e-12);
        assert!((kick_sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn leapfrog_tracks_oscillator_over_one_interval() {
        let mut stepper = Leapfrog;
        let mut y = [1.0, 0.0];
        let mut t = 0.0;
        stepper.advance_interval(&Oscillator, &mut t, &mut y, 0.001, 1000);
        assert!((t - 1.0).abs() < 1e-9);
        assert!((y[0] - 1.0f64.cos()).abs() < 1e-5);
        assert!((y[1] + 1.0f64.sin()).abs() < 1e-5);
    }

    #[test]
    fn merged_boundary_drift_matches_separate_periods() {
        // One interval of two sub-steps (with the folded c4 + c1 drift)
        // against two single-sub-step intervals (separate drifts).
        let mut merged = Symplec4;
        let mut y1 = [1.0, 0.0];
        let mut t1 = 0.0;
        merged.advance_interval(&Oscillator, &mut t1, &mut y1, 0.1, 2);

        let mut split = Symplec4;
        let mut y2 = [1.0, 0.0];
        let mut t2 = 0.0;
        split.advance_interval(&Oscillator, &mut t2, &mut y2, 0.1, 1);
        split.advance_interval(&Oscillator, &mut t2, &mut y2, 0.1, 1);

        assert!((y1[0] - y2[0]).abs() < 1e-14);
        assert!((y1[1] - y2[1]).abs() < 1e-14);
    }

    #[test]
    fn yoshida_merged_boundary_drift_matches_separate_periods() {
        let sys = OscillatorForce;
        let mut merged = Symplec6::new(1);
        let mut q1 = [1.0];
        let mut p1 = [0.0];
        let mut t1 = 0.0;
        merged.advance_interval(&sys, &mut t1, &mut q1, &mut p1, 0.1, 2);

        let mut split = Symplec6::new(1);
        let mut q2 = [1.0];
        let mut p2 = [0.0];
        let mut t2 = 0.0;
        split.advance_interval(&sys, &mut t2, &mut q2, &mut p2, 0.1, 1);
        split.advance_interval(&sys, &mut t2, &mut q2, &mut p2, 0.1, 1);

        assert!((q1[0] - q2[0]).abs() < 1e-14);
        assert!((p1[0] - p2[0]).abs() < 1e-14);
    }

    #[test]
    fn yoshida_tracks_oscillator_over_one_interval() {
        let sys = OscillatorForce;
        let mut stepper = Symplec6::new(1);
        let mut q = [1.0];
        let mut p = [0.0];
        let mut t = 0.0;
        stepper.advance_interval(&sys, &mut t, &mut q, &mut p, 0.01, 100);
        assert!((q[0] - 1.0f64.cos()).abs() < 1e-9);
        assert!((p[0] + 1.0f64.sin()).abs() < 1e-9);
    }

    #[test]
    fn leapfrog_energy_stays_bounded_over_many_periods() {
        let mut stepper = Leapfrog;
        let mut y = [1.0, 0.0];
        let mut t = 0.0;
        let energy = |y: &[f64]| 0.5 * y[1] * y[1] + 0.5 * y[0] * y[0];
        let e0 = energy(&y);
        // ~160 periods at a moderate step; a non-symplectic method drifts
        // secularly here, leapfrog oscillates within an O(dt^2) band.
        for _ in 0..1000 {
            stepper.advance_interval(&Oscillator, &mut t, &mut y, 0.1, 10);
        }
        assert!((energy(&y) - e0).abs() / e0 < 5e-3);
    }
}
