//! Decision-variable layout.
//!
//! Control points are contiguous per segment, then per axis (x, y, z), then
//! per coefficient `0..=order`:
//! `index = segment * 3 * (order + 1) + axis * (order + 1) + coeff`.
//! The nonlinear evaluator appends one time variable per segment after all
//! coefficients.

use crate::problem::TgProblem;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub order: usize,
    pub segments: usize,
}

impl Layout {
    #[inline]
    pub fn new(order: usize, segments: usize) -> Self {
        Self { order, segments }
    }

    #[inline]
    pub fn of(problem: &TgProblem) -> Self {
        Self::new(problem.trajectory_order, problem.segments())
    }

    /// Control points per axis of one segment.
    #[inline]
    pub fn per_axis(&self) -> usize {
        self.order + 1
    }

    #[inline]
    pub fn per_segment(&self) -> usize {
        3 * self.per_axis()
    }

    #[inline]
    pub fn n_coef(&self) -> usize {
        self.segments * self.per_segment()
    }

    #[inline]
    pub fn index(&self, segment: usize, axis: usize, coeff: usize) -> usize {
        segment * self.per_segment() + axis * self.per_axis() + coeff
    }

    /// Last control point of `axis` in `segment`.
    #[inline]
    pub fn last(&self, segment: usize, axis: usize) -> usize {
        self.index(segment, axis, self.order)
    }

    /// Column of `segment`'s time in the `[coef, times]` variable vector.
    #[inline]
    pub fn time(&self, segment: usize) -> usize {
        self.n_coef() + segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_of_final_segment_matches_flat_arithmetic() {
        let lay = Layout::new(5, 4);
        let n_coef = lay.n_coef();
        for axis in 0..3 {
            assert_eq!(
                lay.last(lay.segments - 1, axis),
                n_coef - 1 - (2 - axis) * lay.per_axis()
            );
        }
    }

    #[test]
    fn indices_are_dense_and_ordered() {
        let lay = Layout::new(3, 2);
        let mut expected = 0;
        for k in 0..2 {
            for axis in 0..3 {
                for c in 0..=3 {
                    assert_eq!(lay.index(k, axis, c), expected);
                    expected += 1;
                }
            }
        }
        assert_eq!(expected, lay.n_coef());
        assert_eq!(lay.time(1), 25);
    }
}
