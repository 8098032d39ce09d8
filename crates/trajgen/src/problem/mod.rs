//! Trajectory-generation problems over a box corridor.
//!
//! Purpose
//! - `TgProblem` bundles the corridor, the shared MQM cost block, boundary
//!   conditions, limits and feature flags consumed by `assembly`.
//! - `slice_corridor` adds segments by splitting middle boxes round-robin.
//! - JSON persistence with derived bounds re-established on every load.
//!
//! Code cross-refs: `geom::CorridorBox`, `assembly::{construct_a_matrix, construct_p_matrix}`.

mod io;
mod slice;
mod types;

pub use slice::{slice_corridor, SliceError};
pub use types::{same_problem, ProblemError, TgProblem};
