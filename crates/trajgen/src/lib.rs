//! Corridor-constrained piecewise-Bezier trajectory generation.
//!
//! A corridor is a chain of overlapping axis-aligned boxes; each box hosts one
//! Bezier segment with its own duration. This crate builds the problem, slices
//! boxes to refine it, assembles solver inputs (cost matrix, linear
//! constraints, nonlinear evaluator), refines segment times from solver
//! answers and maps solutions back to trajectories.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.
//! - Breaking changes are fine when they improve clarity; `api` collects the
//!   re-exports callers should prefer.

pub mod api;
pub mod assembly;
pub mod bezier;
pub mod geom;
pub mod problem;
pub mod rand3;
pub mod refine;
pub mod trajectory;

#[cfg(test)]
mod fixtures;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use geom::{Axis, CorridorBox};
pub use problem::TgProblem;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::assembly::{
        construct_a_matrix, construct_p_matrix, eval_nlp, time_gradient, AssemblyCfg, CostModel,
        NlpRequest, Triangle,
    };
    pub use crate::geom::{Axis, CorridorBox};
    pub use crate::problem::{slice_corridor, TgProblem};
    pub use crate::rand3::{draw_corridor, CorridorCfg, ReplayToken};
    pub use crate::refine::{refine_times, RefineCfg};
    pub use crate::trajectory::Trajectory;
    pub use nalgebra::{DVector, Vector3};
}
