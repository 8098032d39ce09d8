//! `CorridorBox`: 8-corner axis-aligned box with derived bounds and time.

use nalgebra::{SMatrix, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cfg::CONTAIN_EPS;

/// Per-axis `(lower, upper)` pairs for x, y, z.
pub type Bounds3 = [(f64, f64); 3];

/// Corner coordinates, one row per corner (see module docs for the layout).
pub type Vertices = SMatrix<f64, 8, 3>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeomError {
    #[error("axis {0:?} not recognized (expected x, y or z)")]
    UnknownAxis(char),
}

/// Spatial axis of a corridor box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl TryFrom<char> for Axis {
    type Error = GeomError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_lowercase() {
            'x' => Ok(Axis::X),
            'y' => Ok(Axis::Y),
            'z' => Ok(Axis::Z),
            _ => Err(GeomError::UnknownAxis(c)),
        }
    }
}

/// One corridor cell.
///
/// Invariants:
/// - `bounds[i] == (min corner coord on axis i, max corner coord on axis i)`
///   whenever the corners follow the layout; `set_box()` re-derives it and
///   must run after any corner mutation.
/// - `valid` is a reserved deletion mark; assembly never reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorridorBox {
    pub vertex: Vertices,
    pub center: Vector3<f64>,
    pub valid: bool,
    /// Time allocated to traverse this cell.
    pub t: f64,
    pub bounds: Bounds3,
}

impl Default for CorridorBox {
    fn default() -> Self {
        Self {
            vertex: Vertices::zeros(),
            center: Vector3::zeros(),
            valid: true,
            t: 0.0,
            bounds: [(0.0, 0.0); 3],
        }
    }
}

impl CorridorBox {
    /// Build corners and center from axis-aligned bounds.
    pub fn from_bounds(bounds: Bounds3) -> Self {
        let [(x_lo, x_hi), (y_lo, y_hi), (z_lo, z_hi)] = bounds;
        let mut vertex = Vertices::zeros();
        for r in [2, 3, 6, 7] {
            vertex[(r, 0)] = x_lo;
        }
        for r in [0, 1, 4, 5] {
            vertex[(r, 0)] = x_hi;
        }
        for r in [0, 3, 4, 7] {
            vertex[(r, 1)] = y_lo;
        }
        for r in [1, 2, 5, 6] {
            vertex[(r, 1)] = y_hi;
        }
        for r in 4..8 {
            vertex[(r, 2)] = z_lo;
        }
        for r in 0..4 {
            vertex[(r, 2)] = z_hi;
        }
        let center = Vector3::new(
            0.5 * (x_lo + x_hi),
            0.5 * (y_lo + y_hi),
            0.5 * (z_lo + z_hi),
        );
        let mut b = Self {
            vertex,
            center,
            ..Self::default()
        };
        b.set_box();
        b
    }

    /// Box from explicit corners (layout as in the module docs) and center.
    pub fn from_vertices(vertex: Vertices, center: Vector3<f64>) -> Self {
        let mut b = Self {
            vertex,
            center,
            ..Self::default()
        };
        b.set_box();
        b
    }

    /// Assign corners and pad every face outward by `resolution / 2`
    /// (occupancy voxels are reported by their centers).
    pub fn set_vertex(&mut self, vertex: Vertices, resolution: f64) {
        let h = 0.5 * resolution;
        self.vertex = vertex;
        for r in 0..8 {
            let x_sign = if matches!(r, 0 | 1 | 4 | 5) { 1.0 } else { -1.0 };
            let y_sign = if matches!(r, 1 | 2 | 5 | 6) { 1.0 } else { -1.0 };
            let z_sign = if r < 4 { 1.0 } else { -1.0 };
            self.vertex[(r, 0)] += x_sign * h;
            self.vertex[(r, 1)] += y_sign * h;
            self.vertex[(r, 2)] += z_sign * h;
        }
        self.set_box();
    }

    /// Re-derive `bounds` from corners 0, 1, 3 and 4. Idempotent.
    pub fn set_box(&mut self) {
        let v = &self.vertex;
        self.bounds = [
            (v[(3, 0)], v[(0, 0)]),
            (v[(0, 1)], v[(1, 1)]),
            (v[(4, 2)], v[(1, 2)]),
        ];
    }

    #[inline]
    pub fn extent(&self, axis: Axis) -> f64 {
        let (lo, hi) = self.bounds[axis.index()];
        hi - lo
    }

    /// Slice along `axis` into two overlapping bound sets.
    ///
    /// With `[lo, hi]` on the axis the children cover
    /// `[lo, lo + (0.5 + overlap)(hi - lo)]` and `[lo + (0.5 - overlap)(hi - lo), hi]`.
    /// Time is not split here.
    pub fn slice_into_two(
        &mut self,
        axis: char,
        overlap: f64,
    ) -> Result<(Bounds3, Bounds3), GeomError> {
        let axis = Axis::try_from(axis)?;
        self.set_box();
        let i = axis.index();
        let (lo, hi) = self.bounds[i];
        let upper_of_first = lo + (0.5 + overlap) * (hi - lo);
        let lower_of_second = lo + (0.5 - overlap) * (hi - lo);
        let mut first = self.bounds;
        let mut second = self.bounds;
        first[i] = (lo, upper_of_first);
        second[i] = (lower_of_second, hi);
        Ok((first, second))
    }

    /// Two child boxes from `slice_into_two`, each carrying half of `t`.
    pub fn split(&mut self, axis: char, overlap: f64) -> Result<(Self, Self), GeomError> {
        let (b1, b2) = self.slice_into_two(axis, overlap)?;
        let mut first = Self::from_bounds(b1);
        let mut second = Self::from_bounds(b2);
        first.t = 0.5 * self.t;
        second.t = 0.5 * self.t;
        Ok((first, second))
    }

    /// `true` if `outer` encloses `inner`, compared on opposite corners 0 and 6.
    /// Axis-aligned boxes only.
    pub fn contains(outer: &Self, inner: &Self) -> bool {
        let (o, i) = (&outer.vertex, &inner.vertex);
        o[(0, 0)] >= i[(0, 0)]
            && o[(0, 1)] <= i[(0, 1)]
            && o[(0, 2)] >= i[(0, 2)]
            && o[(6, 0)] <= i[(6, 0)]
            && o[(6, 1)] >= i[(6, 1)]
            && o[(6, 2)] <= i[(6, 2)]
    }

    pub fn contains_point(&self, p: &Vector3<f64>) -> bool {
        self.bounds
            .iter()
            .enumerate()
            .all(|(i, &(lo, hi))| p[i] >= lo - CONTAIN_EPS && p[i] <= hi + CONTAIN_EPS)
    }
}
