//! Nonlinear evaluator over `[coef, room_time]`.
//!
//! Unlike the fixed-time QP, every row here is written in physical units
//! (multiplied through by the segment times), so row bounds do not depend on
//! the times and the Jacobian w.r.t. `tₖ` is explicit. The acceleration limit
//! becomes two one-sided rows per control-point triple.

use nalgebra::DVector;

use super::cfg::NLP_INF;
use super::cost::{eval_cost, CostModel};
use super::layout::Layout;
use super::linear::physical_bounds;
use crate::problem::TgProblem;

/// Which outputs `eval_nlp` fills. `f` and the counts are always produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NlpRequest {
    /// Jacobian values `g`.
    pub gradient: bool,
    /// Jacobian sparsity `grow`/`gcol`.
    pub structure: bool,
    /// Row bounds `lb`/`ub`.
    pub bounds: bool,
}

impl Default for NlpRequest {
    fn default() -> Self {
        Self {
            gradient: true,
            structure: true,
            bounds: true,
        }
    }
}

/// Row values, bounds and sparse Jacobian. Unrequested parts are empty.
#[derive(Clone, Debug, PartialEq)]
pub struct NlpEval {
    pub f: DVector<f64>,
    pub lb: DVector<f64>,
    pub ub: DVector<f64>,
    pub g: DVector<f64>,
    pub grow: Vec<usize>,
    pub gcol: Vec<usize>,
    pub nf: usize,
    pub ng: usize,
}

struct NlpTape {
    req: NlpRequest,
    f: Vec<f64>,
    lb: Vec<f64>,
    ub: Vec<f64>,
    g: Vec<f64>,
    grow: Vec<usize>,
    gcol: Vec<usize>,
    row: usize,
    ng: usize,
}

impl NlpTape {
    fn new(req: NlpRequest) -> Self {
        Self {
            req,
            f: Vec::new(),
            lb: Vec::new(),
            ub: Vec::new(),
            g: Vec::new(),
            grow: Vec::new(),
            gcol: Vec::new(),
            row: 0,
            ng: 0,
        }
    }

    #[inline]
    fn entry(&mut self, col: usize, val: f64) {
        if self.req.gradient {
            self.g.push(val);
        }
        if self.req.structure {
            self.grow.push(self.row);
            self.gcol.push(col);
        }
        self.ng += 1;
    }

    #[inline]
    fn close_row(&mut self, value: f64, lo: f64, hi: f64) {
        self.f.push(value);
        if self.req.bounds {
            self.lb.push(lo);
            self.ub.push(hi);
        }
        self.row += 1;
    }

    fn finish(self) -> NlpEval {
        let nf = self.f.len();
        NlpEval {
            f: DVector::from_vec(self.f),
            lb: DVector::from_vec(self.lb),
            ub: DVector::from_vec(self.ub),
            g: DVector::from_vec(self.g),
            grow: self.grow,
            gcol: self.gcol,
            nf,
            ng: self.ng,
        }
    }
}

/// `[1, -2, 1]` applied to three consecutive variables.
#[inline]
fn second_diff(x: &DVector<f64>, first: usize) -> f64 {
    x[first] - 2.0 * x[first + 1] + x[first + 2]
}

/// Number of rows and Jacobian entries `eval_nlp` produces for `problem`.
pub fn nlp_dims(problem: &TgProblem) -> (usize, usize) {
    let lay = Layout::of(problem);
    let n = problem.trajectory_order;
    let s = problem.segments();
    let n_coef = lay.n_coef();
    let v = if problem.limit_velocity { 3 * n * s } else { 0 };
    let a = if problem.limit_acceleration {
        3 * (n - 1) * s
    } else {
        0
    };
    let nf = 1 + v + 2 * a + 9 + 9 + 9 * (s - 1) + n_coef + 1;
    let ng = (n_coef + s) + 2 * v + 8 * a + 24 + 24 + 48 * (s - 1) + 2 * n_coef + s;
    (nf, ng)
}

/// Evaluate every row at `x = [coef, room_time]`.
///
/// Trusts `problem` (see `TgProblem::validate`) and `x.len() == ncoef + segments`.
pub fn eval_nlp(problem: &TgProblem, x: &DVector<f64>, req: NlpRequest) -> NlpEval {
    let lay = Layout::of(problem);
    let n = problem.trajectory_order;
    let nf = n as f64;
    let acc_c = nf * (nf - 1.0);
    let segs = problem.segments();
    let n_coef = lay.n_coef();
    let coef = x.rows(0, n_coef).into_owned();
    let times: Vec<f64> = x.rows(n_coef, segs).iter().copied().collect();
    let mut tape = NlpTape::new(req);

    let model = CostModel::of(problem);
    let cost = eval_cost(&model, &coef, &times, req.gradient);
    for col in 0..n_coef + segs {
        let val = cost.grad.as_ref().map_or(0.0, |g| g[col]);
        tape.entry(col, val);
    }
    tape.close_row(cost.cost, -NLP_INF, NLP_INF);
    tracing::trace!(row = tape.row, "objective");

    if problem.limit_velocity {
        let vmax = problem.max_velocity;
        for k in 0..segs {
            for axis in 0..3 {
                for q in 0..n {
                    let c0 = lay.index(k, axis, q);
                    tape.entry(c0, -nf);
                    tape.entry(c0 + 1, nf);
                    tape.close_row(nf * (x[c0 + 1] - x[c0]), -vmax, vmax);
                }
            }
        }
        tracing::trace!(row = tape.row, "velocity limits");
    }

    if problem.limit_acceleration {
        let amax = problem.max_acceleration;
        for k in 0..segs {
            let t = times[k];
            for axis in 0..3 {
                for q in 0..n - 1 {
                    let c0 = lay.index(k, axis, q);
                    let dd = acc_c * second_diff(x, c0);
                    for (sign, lo, hi) in [(1.0, 0.0, NLP_INF), (-1.0, -NLP_INF, 0.0)] {
                        tape.entry(c0, acc_c);
                        tape.entry(c0 + 1, -2.0 * acc_c);
                        tape.entry(c0 + 2, acc_c);
                        tape.entry(lay.time(k), sign * amax);
                        tape.close_row(dd + sign * amax * t, lo, hi);
                    }
                }
            }
        }
        tracing::trace!(row = tape.row, "acceleration limits");
    }

    let last = segs - 1;
    for (seg, side) in [(0, 0), (last, 1)] {
        let t = times[seg];
        let tcol = lay.time(seg);
        for axis in 0..3 {
            let c = lay.index(seg, axis, if side == 0 { 0 } else { n });
            let target = problem.position[(side, axis)];
            tape.entry(c, t);
            tape.entry(tcol, x[c]);
            tape.close_row(t * x[c], target, target);
        }
        for axis in 0..3 {
            let c0 = lay.index(seg, axis, if side == 0 { 0 } else { n - 1 });
            let target = problem.velocity[(side, axis)];
            tape.entry(c0, -nf);
            tape.entry(c0 + 1, nf);
            tape.close_row(nf * (x[c0 + 1] - x[c0]), target, target);
        }
        for axis in 0..3 {
            let c0 = lay.index(seg, axis, if side == 0 { 0 } else { n - 2 });
            let acc = problem.acceleration[(side, axis)];
            tape.entry(c0, acc_c);
            tape.entry(c0 + 1, -2.0 * acc_c);
            tape.entry(c0 + 2, acc_c);
            tape.entry(tcol, -acc);
            tape.close_row(acc_c * second_diff(x, c0) - t * acc, 0.0, 0.0);
        }
    }
    tracing::trace!(row = tape.row, "boundary conditions");

    for k in 0..segs - 1 {
        let (tk, tn) = (times[k], times[k + 1]);
        let (tcol_k, tcol_n) = (lay.time(k), lay.time(k + 1));
        for axis in 0..3 {
            let a = lay.last(k, axis);
            let b = lay.index(k + 1, axis, 0);
            tape.entry(a, tk);
            tape.entry(b, -tn);
            tape.entry(tcol_k, x[a]);
            tape.entry(tcol_n, -x[b]);
            tape.close_row(tk * x[a] - tn * x[b], 0.0, 0.0);
        }
        for axis in 0..3 {
            let end = lay.last(k, axis);
            let start = lay.index(k + 1, axis, 0);
            tape.entry(end - 1, -1.0);
            tape.entry(end, 1.0);
            tape.entry(start, 1.0);
            tape.entry(start + 1, -1.0);
            let value = x[end] - x[end - 1] - (x[start + 1] - x[start]);
            tape.close_row(value, 0.0, 0.0);
        }
        for axis in 0..3 {
            let a0 = lay.last(k, axis) - 2;
            let b0 = lay.index(k + 1, axis, 0);
            let (dda, ddb) = (second_diff(x, a0), second_diff(x, b0));
            tape.entry(a0, tn);
            tape.entry(a0 + 1, -2.0 * tn);
            tape.entry(a0 + 2, tn);
            tape.entry(b0, -tk);
            tape.entry(b0 + 1, 2.0 * tk);
            tape.entry(b0 + 2, -tk);
            tape.entry(tcol_k, -ddb);
            tape.entry(tcol_n, dda);
            tape.close_row(tn * dda - tk * ddb, 0.0, 0.0);
        }
    }
    tracing::trace!(row = tape.row, "joint continuity");

    for k in 0..segs {
        let t = times[k];
        for axis in 0..3 {
            let (lo, hi) = physical_bounds(problem, k, axis);
            for q in 0..lay.per_axis() {
                let c = lay.index(k, axis, q);
                tape.entry(c, t);
                tape.entry(lay.time(k), x[c]);
                tape.close_row(t * x[c], lo, hi);
            }
        }
    }
    tracing::trace!(row = tape.row, "corridor bounds");

    for k in 0..segs {
        tape.entry(lay.time(k), 1.0);
    }
    tape.close_row(times.iter().sum(), -NLP_INF, NLP_INF);

    tape.finish()
}
