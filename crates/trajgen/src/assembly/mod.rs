//! Solver-facing assembly: cost matrix, linear constraints, nonlinear
//! evaluator and per-segment time gradients.
//!
//! Purpose
//! - Turn a validated `TgProblem` into the numeric blocks an external QP or
//!   NLP solver consumes, and turn the solver's primal/dual answer back into
//!   `∂J/∂tₖ` for outer time-allocation loops.
//!
//! Why this design
//! - Decision variables are control points scaled by `1/tₖ`; the fixed-time QP
//!   then has time-free velocity rows and `1/tₖ` acceleration rows.
//! - Rows are generated by one traversal per view (`linear`, `nlp`); gradients
//!   reuse the same traversal instead of re-deriving the row layout.
//! - Configuration is passed explicitly (`AssemblyCfg`, `NlpRequest`).
//!
//! Code cross-refs: `problem::TgProblem`, `bezier::mqm_for`, `trajectory`.

mod cfg;
mod cost;
mod layout;
mod linear;
mod nlp;
mod tape;

use nalgebra::DVector;

pub use cfg::{AssemblyCfg, NLP_INF};
pub use cost::{
    construct_p_matrix, eval_cost, gradient_from_p, CostEval, CostModel, Triangle,
    UnknownTriangle,
};
pub use layout::Layout;
pub use linear::{construct_a_matrix, gradient_from_a, RowKind};
pub use nlp::{eval_nlp, nlp_dims, NlpEval, NlpRequest};
pub use tape::{ConstraintTape, LinearConstr, SparseTriplets, Violations};

use crate::problem::TgProblem;

/// `∂J/∂tₖ` of the fixed-time QP at its optimum: cost sensitivity plus the
/// constraint terms weighted by the duals, plus `tf_weight` per segment for
/// a total-time penalty.
pub fn time_gradient(
    problem: &TgProblem,
    sol: &DVector<f64>,
    lmdy: &DVector<f64>,
    lmdz: &DVector<f64>,
    tf_weight: f64,
    cfg: &AssemblyCfg,
) -> DVector<f64> {
    let times: Vec<f64> = problem.corridor.iter().map(|b| b.t).collect();
    let pgrad = gradient_from_p(&CostModel::of(problem), &times, sol);
    let agrad = gradient_from_a(problem, sol, lmdy, lmdz, cfg);
    (pgrad + agrad).add_scalar(tf_weight)
}
