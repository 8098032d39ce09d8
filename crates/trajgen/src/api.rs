//! Curated internal API (UNSTABLE).
//!
//! Important
//! - This is not a public API. It is a convenience surface for the CLI,
//!   benches and examples. Breaking changes are allowed and expected.

// Corridor geometry
pub use crate::geom::{Axis, Bounds3, CorridorBox, GeomError, DEFAULT_OVERLAP};
// Problem definition, persistence and refinement
pub use crate::problem::{same_problem, slice_corridor, ProblemError, SliceError, TgProblem};
// Bezier basis
pub use crate::bezier::{bernstein_to_monomial, mqm, mqm_for};
// Solver inputs and time gradients
pub use crate::assembly::{
    construct_a_matrix, construct_p_matrix, eval_cost, eval_nlp, gradient_from_a,
    gradient_from_p, nlp_dims, time_gradient, AssemblyCfg, CostModel, Layout, LinearConstr,
    NlpEval, NlpRequest, SparseTriplets, Triangle, NLP_INF,
};
// Random corridors
pub use crate::rand3::{
    draw_corridor, CorridorCfg, CorridorGenerator, CorridorSample, GeneratorError, ReplayToken,
};
// Segment-time refinement
pub use crate::refine::{
    fd_time_gradient, mellinger_time_gradient, refine_times, GradientMethod, RefineCfg,
    RefineError, RefineReport, StopReason,
};
// Solution mapping
pub use crate::trajectory::{Trajectory, TrajectoryError};
