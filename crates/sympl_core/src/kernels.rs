use crate::traits::Scalar;

/// Elementwise position update: `out[i] = q[i] + dt * p[i]`.
pub fn leap_q<T: Scalar>(q: &[T], p: &[T], dt: T, out: &mut [T]) {
    for i in 0..q.len() {
        out[i] = q[i] + dt * p[i];
    }
}

/// Elementwise momentum update: `out[i] = p[i] + dt * a[i]`.
pub fn leap_p<T: Scalar>(p: &[T], dt: T, a: &[T], out: &mut [T]) {
    for i in 0..p.len() {
        out[i] = p[i] + dt * a[i];
    }
}

/// Copies a packed state into one contiguous output block.
pub fn write_block<T: Copy>(y: &[T], block: &mut [T]) {
    block.copy_from_slice(y);
}

/// Concatenates split position/momentum buffers into one output block.
pub fn write_block_qp<T: Copy>(q: &[T], p: &[T], block: &mut [T]) {
    let dim = q.len();
    block[..dim].copy_from_slice(q);
    block[dim..].copy_from_slice(p);
}

/// Replaces the tangential-velocity component of a cylindrical/polar state
/// with the angular momentum Lz = y[0] * y[2], which integrates better.
pub fn encode_lz<T: Scalar>(y: &mut [T]) {
    y[2] = y[2] * y[0];
}

/// Inverse of [`encode_lz`], applied to every written output block so the
/// caller always sees the velocity-like quantity.
pub fn decode_lz<T: Scalar>(block: &mut [T]) {
    block[2] = block[2] / block[0];
}
