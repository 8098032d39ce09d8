//! Axis-aligned corridor boxes.
//!
//! Purpose
//! - Represent one convex corridor cell as an explicit 8-corner box with a
//!   derived per-axis bound list, and split cells into overlapping halves.
//! - Stay explicit about the corner winding order: bounds are read back from
//!   fixed corner rows, so every constructor must follow the same layout.
//!
//! Corner layout (row index of `CorridorBox::vertex`)
//! ```text
//!            3------------2
//!           /|           /|              ^
//!          / |          / |              | z
//!         0--|---------1  |              |
//!         |  7---------|--6              /--------> y
//!         | /          | /              /
//!         |/           |/              / x
//!         4------------5
//! ```
//! Rows 0,1,4,5 sit on the upper x face; rows 0,3,4,7 on the lower y face;
//! rows 0..=3 on the upper z face.
//!
//! Code cross-refs: `problem::slice_corridor`, `assembly::linear`.

pub(crate) mod cfg;
mod types;

pub use cfg::DEFAULT_OVERLAP;
pub use types::{Axis, Bounds3, CorridorBox, GeomError, Vertices};

#[cfg(test)]
mod tests;
