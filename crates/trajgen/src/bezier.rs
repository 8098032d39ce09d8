//! Bernstein (Bezier) basis matrices for one trajectory piece.
//!
//! Purpose
//! - Produce the basis change `M` (Bernstein → monomial, on `s ∈ [0, 1]`) and
//!   the cost matrix `MQM = Mᵀ Q M` for minimizing `∫₀¹ (d^r p / ds^r)² ds`
//!   directly in control-point coordinates.
//! - Time scaling is not applied here; `assembly::cost` multiplies each
//!   segment's block by its time weight.
//!
//! Code cross-refs: `TgProblem::mqm`, `trajectory::Trajectory::monomial_coefficients`.

use nalgebra::DMatrix;

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, j| acc * (n - j) as f64 / (j + 1) as f64)
}

/// `i! / (i - r)!`, zero when `r > i`.
fn falling(i: usize, r: usize) -> f64 {
    if r > i {
        return 0.0;
    }
    ((i - r + 1)..=i).fold(1.0, |acc, v| acc * v as f64)
}

/// Map Bernstein control points `b` to monomial coefficients `c = M b`.
pub fn bernstein_to_monomial(order: usize) -> DMatrix<f64> {
    let n = order;
    DMatrix::from_fn(n + 1, n + 1, |i, k| {
        if i < k {
            0.0
        } else {
            let sign = if (i - k) % 2 == 0 { 1.0 } else { -1.0 };
            sign * binomial(n, k) * binomial(n - k, i - k)
        }
    })
}

/// Gram matrix of the `r`-th derivative of the monomial basis over `[0, 1]`.
pub fn monomial_cost(order: usize, r: usize) -> DMatrix<f64> {
    DMatrix::from_fn(order + 1, order + 1, |i, j| {
        if i < r || j < r {
            0.0
        } else {
            falling(i, r) * falling(j, r) / (i + j + 1 - 2 * r) as f64
        }
    })
}

/// Cost matrix in control-point coordinates for derivative order `r`.
pub fn mqm(order: usize, r: usize) -> DMatrix<f64> {
    let m = bernstein_to_monomial(order);
    let q = m.transpose() * monomial_cost(order, r) * &m;
    // Round-off in the triple product leaves q slightly asymmetric.
    (&q + q.transpose()) * 0.5
}

/// MQM for a possibly fractional minimize order; the derivative order is
/// `ceil(minimize_order)` and the fractional blend lives in the time weights.
pub fn mqm_for(order: usize, minimize_order: f64) -> DMatrix<f64> {
    mqm(order, minimize_order.ceil().max(0.0) as usize)
}
