//! Linear constraints of the fixed-time QP and their time sensitivities.
//!
//! Every row is produced once by `for_each_row`, together with the derivative
//! of its coefficients with respect to the segment times it depends on, so
//! `construct_a_matrix` and `gradient_from_a` cannot drift apart.
//!
//! Row order: velocity limits, acceleration limits (each only if enabled),
//! start position/velocity/acceleration, end position/velocity/acceleration,
//! then position/velocity/acceleration continuity for every joint.

use nalgebra::DVector;

use super::cfg::AssemblyCfg;
use super::layout::Layout;
use super::tape::{ConstraintTape, LinearConstr};
use crate::problem::TgProblem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    VelocityLimit,
    AccelerationLimit,
    StartPosition,
    StartVelocity,
    StartAcceleration,
    EndPosition,
    EndVelocity,
    EndAcceleration,
    JointPosition,
    JointVelocity,
    JointAcceleration,
}

pub(crate) struct LinRow<'a> {
    pub kind: RowKind,
    pub seg: usize,
    pub axis: usize,
    pub cols: &'a [usize],
    pub vals: &'a [f64],
    pub lo: f64,
    pub hi: f64,
    /// `(segment, position in cols, ∂val/∂t_segment)`
    pub dt: &'a [(usize, usize, f64)],
}

/// Scaled bounds of one control-point variable.
pub(crate) struct VarBound {
    pub seg: usize,
    pub axis: usize,
    pub coeff: usize,
    pub var: usize,
    pub lo: f64,
    pub hi: f64,
}

/// Physical per-axis interval for segment `k`: the box shrunk by `margin`,
/// except for the first segment which starts at the given position.
pub(crate) fn physical_bounds(p: &TgProblem, k: usize, axis: usize) -> (f64, f64) {
    let (lo, hi) = p.corridor[k].bounds[axis];
    if k > 0 {
        (lo + p.margin, hi - p.margin)
    } else {
        (lo, hi)
    }
}

pub(crate) fn for_each_var_bound(p: &TgProblem, mut visit: impl FnMut(&VarBound)) {
    let lay = Layout::of(p);
    for (k, cell) in p.corridor.iter().enumerate() {
        for axis in 0..3 {
            let (lo, hi) = physical_bounds(p, k, axis);
            for coeff in 0..lay.per_axis() {
                visit(&VarBound {
                    seg: k,
                    axis,
                    coeff,
                    var: lay.index(k, axis, coeff),
                    lo: lo / cell.t,
                    hi: hi / cell.t,
                });
            }
        }
    }
}

/// Second-difference stencil `c·[1, -2, 1]` and its derivative when `c ∝ 1/t`.
#[inline]
fn stencil_over_t(c: f64, t: f64) -> ([f64; 3], [f64; 3]) {
    let vals = [c / t, -2.0 * c / t, c / t];
    (vals, vals.map(|v| -v / t))
}

pub(crate) fn for_each_row(p: &TgProblem, mut visit: impl FnMut(&LinRow<'_>)) {
    let lay = Layout::of(p);
    let n = p.trajectory_order;
    let nf = n as f64;
    let acc_c = nf * (nf - 1.0);
    let segs = p.segments();

    if p.limit_velocity {
        for k in 0..segs {
            for axis in 0..3 {
                for q in 0..n {
                    let cols = [lay.index(k, axis, q), lay.index(k, axis, q + 1)];
                    visit(&LinRow {
                        kind: RowKind::VelocityLimit,
                        seg: k,
                        axis,
                        cols: &cols,
                        vals: &[-nf, nf],
                        lo: -p.max_velocity,
                        hi: p.max_velocity,
                        dt: &[],
                    });
                }
            }
        }
    }

    if p.limit_acceleration {
        for k in 0..segs {
            let t = p.corridor[k].t;
            let (vals, dvals) = stencil_over_t(acc_c, t);
            let dt = [(k, 0, dvals[0]), (k, 1, dvals[1]), (k, 2, dvals[2])];
            for axis in 0..3 {
                for q in 0..n - 1 {
                    let cols = [
                        lay.index(k, axis, q),
                        lay.index(k, axis, q + 1),
                        lay.index(k, axis, q + 2),
                    ];
                    visit(&LinRow {
                        kind: RowKind::AccelerationLimit,
                        seg: k,
                        axis,
                        cols: &cols,
                        vals: &vals,
                        lo: -p.max_acceleration,
                        hi: p.max_acceleration,
                        dt: &dt,
                    });
                }
            }
        }
    }

    // Boundary rows: (segment, first control point of the 3-point window, row 0/1 of the boundary matrices).
    let last = segs - 1;
    for (seg, first_coeff, side, kinds) in [
        (
            0,
            0,
            0,
            [
                RowKind::StartPosition,
                RowKind::StartVelocity,
                RowKind::StartAcceleration,
            ],
        ),
        (
            last,
            n - 2,
            1,
            [
                RowKind::EndPosition,
                RowKind::EndVelocity,
                RowKind::EndAcceleration,
            ],
        ),
    ] {
        let t = p.corridor[seg].t;
        // position is pinned on the outermost control point of the window
        let pos_coeff = if side == 0 { 0 } else { n };
        for axis in 0..3 {
            let cols = [lay.index(seg, axis, pos_coeff)];
            let target = p.position[(side, axis)];
            visit(&LinRow {
                kind: kinds[0],
                seg,
                axis,
                cols: &cols,
                vals: &[t],
                lo: target,
                hi: target,
                dt: &[(seg, 0, 1.0)],
            });
        }
        let vel_first = if side == 0 { 0 } else { n - 1 };
        for axis in 0..3 {
            let cols = [
                lay.index(seg, axis, vel_first),
                lay.index(seg, axis, vel_first + 1),
            ];
            let target = p.velocity[(side, axis)];
            visit(&LinRow {
                kind: kinds[1],
                seg,
                axis,
                cols: &cols,
                vals: &[-nf, nf],
                lo: target,
                hi: target,
                dt: &[],
            });
        }
        let (vals, dvals) = stencil_over_t(acc_c, t);
        let dt = [(seg, 0, dvals[0]), (seg, 1, dvals[1]), (seg, 2, dvals[2])];
        for axis in 0..3 {
            let cols = [
                lay.index(seg, axis, first_coeff),
                lay.index(seg, axis, first_coeff + 1),
                lay.index(seg, axis, first_coeff + 2),
            ];
            let target = p.acceleration[(side, axis)];
            visit(&LinRow {
                kind: kinds[2],
                seg,
                axis,
                cols: &cols,
                vals: &vals,
                lo: target,
                hi: target,
                dt: &dt,
            });
        }
    }

    for k in 0..segs.saturating_sub(1) {
        let (tk, tn) = (p.corridor[k].t, p.corridor[k + 1].t);
        for axis in 0..3 {
            let cols = [lay.last(k, axis), lay.index(k + 1, axis, 0)];
            visit(&LinRow {
                kind: RowKind::JointPosition,
                seg: k,
                axis,
                cols: &cols,
                vals: &[tk, -tn],
                lo: 0.0,
                hi: 0.0,
                dt: &[(k, 0, 1.0), (k + 1, 1, -1.0)],
            });
        }
        for axis in 0..3 {
            let end = lay.last(k, axis);
            let start = lay.index(k + 1, axis, 0);
            let cols = [end - 1, end, start, start + 1];
            visit(&LinRow {
                kind: RowKind::JointVelocity,
                seg: k,
                axis,
                cols: &cols,
                vals: &[-1.0, 1.0, 1.0, -1.0],
                lo: 0.0,
                hi: 0.0,
                dt: &[],
            });
        }
        let (here, d_here) = stencil_over_t(1.0, tk);
        let (next, d_next) = stencil_over_t(1.0, tn);
        let vals = [here[0], here[1], here[2], -next[0], -next[1], -next[2]];
        let dt = [
            (k, 0, d_here[0]),
            (k, 1, d_here[1]),
            (k, 2, d_here[2]),
            (k + 1, 3, -d_next[0]),
            (k + 1, 4, -d_next[1]),
            (k + 1, 5, -d_next[2]),
        ];
        for axis in 0..3 {
            let end = lay.last(k, axis);
            let start = lay.index(k + 1, axis, 0);
            let cols = [end - 2, end - 1, end, start, start + 1, start + 2];
            visit(&LinRow {
                kind: RowKind::JointAcceleration,
                seg: k,
                axis,
                cols: &cols,
                vals: &vals,
                lo: 0.0,
                hi: 0.0,
                dt: &dt,
            });
        }
    }
}

/// Every linear row and variable bound of the fixed-time problem.
///
/// Trusts `problem` (see `TgProblem::validate`).
pub fn construct_a_matrix(problem: &TgProblem) -> LinearConstr {
    let mut con = ConstraintTape::default();
    let mut var = ConstraintTape::default();
    for_each_row(problem, |r| {
        con.add_bound(r.lo, r.hi);
        let row_idx = con.a_row;
        con.put_row(row_idx, r.cols, r.vals);
    });
    for_each_var_bound(problem, |b| var.add_bound(b.lo, b.hi));
    LinearConstr::from_tapes(con, var)
}

/// Sensitivity of the Lagrangian's constraint terms to each segment time,
/// given the primal `sol`, row multipliers `lmdy` and bound multipliers `lmdz`
/// (positive `lmdz` means the upper bound is active).
pub fn gradient_from_a(
    problem: &TgProblem,
    sol: &DVector<f64>,
    lmdy: &DVector<f64>,
    lmdz: &DVector<f64>,
    cfg: &AssemblyCfg,
) -> DVector<f64> {
    let mut agrad = DVector::zeros(problem.segments());

    for_each_var_bound(problem, |b| {
        let l = lmdz[b.var];
        let t = problem.corridor[b.seg].t;
        let active = if l > 0.0 { b.hi } else { b.lo };
        // bound = physical / t, so d(bound)/dt = -bound / t
        agrad[b.seg] += l * active / t;
        if cfg.report_duals && l.abs() > cfg.lmd_tol {
            tracing::debug!(
                var = b.var,
                lmdz = l,
                seg = b.seg,
                axis = b.axis,
                coeff = b.coeff,
                value = sol[b.var],
                lb = b.lo,
                ub = b.hi,
                "active variable bound"
            );
        }
    });

    let mut row = 0;
    for_each_row(problem, |r| {
        let l = lmdy[row];
        for &(seg, j, d) in r.dt {
            agrad[seg] += l * d * sol[r.cols[j]];
        }
        if cfg.report_duals && l.abs() > cfg.lmd_tol {
            let value: f64 = r.cols.iter().zip(r.vals).map(|(&c, v)| v * sol[c]).sum();
            tracing::debug!(
                row,
                lmdy = l,
                kind = ?r.kind,
                seg = r.seg,
                axis = r.axis,
                value,
                "active constraint"
            );
        }
        row += 1;
    });
    agrad
}
