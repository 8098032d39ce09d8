//! Shared test problems.

use nalgebra::Matrix2x3;

use crate::bezier::mqm;
use crate::geom::CorridorBox;
use crate::problem::TgProblem;

/// Three overlapping boxes along x, order 5, minimum jerk, limits off,
/// from `(0,0,0)` to `(10,0,0)`.
pub(crate) fn three_segment_problem() -> TgProblem {
    let bounds = [
        [(-1.0, 4.0), (-1.0, 1.0), (-1.0, 1.0)],
        [(3.0, 7.0), (-1.5, 1.5), (-1.0, 1.0)],
        [(6.0, 11.0), (-1.0, 1.0), (-1.0, 1.0)],
    ];
    let times = [1.0, 2.0, 1.5];
    let corridor = bounds
        .iter()
        .zip(times)
        .map(|(b, t)| {
            let mut cell = CorridorBox::from_bounds(*b);
            cell.t = t;
            cell
        })
        .collect();
    let mut position = Matrix2x3::zeros();
    position[(1, 0)] = 10.0;
    TgProblem::new(
        corridor,
        mqm(5, 3),
        position,
        Matrix2x3::zeros(),
        Matrix2x3::zeros(),
        4.0,
        6.0,
        5,
        3.0,
        0.1,
        false,
        false,
    )
}

/// Same corridor with both limits on and a fractional minimize order.
pub(crate) fn limited_problem() -> TgProblem {
    let mut p = three_segment_problem();
    p.limit_velocity = true;
    p.limit_acceleration = true;
    p.minimize_order = 3.5;
    p.velocity[(0, 1)] = 0.5;
    p.acceleration[(0, 2)] = -0.3;
    p.velocity[(1, 0)] = 0.25;
    p.acceleration[(1, 1)] = 0.2;
    p
}

/// Deterministic non-trivial coefficient vector for `p`.
pub(crate) fn wavy_coefficients(p: &TgProblem) -> nalgebra::DVector<f64> {
    nalgebra::DVector::from_fn(p.n_var(), |i, _| ((i as f64) * 0.37).sin() + 0.1 * i as f64)
}
