//! Quadratic cost over all segments and its time sensitivities.
//!
//! Control points are stored scaled by `1/t`, so segment `k` contributes
//! `½ xₖᵀ (MQM · w(tₖ)) xₖ` per axis with `w(t) = t^(3 - 2m)` for minimize
//! order `m`. A fractional `m` blends the floor and ceiling orders with
//! weights `m - ⌊m⌋` and `⌈m⌉ - m`; an integral `m` uses the single power.

use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout::Layout;
use super::tape::SparseTriplets;
use crate::problem::TgProblem;

/// Which part of the symmetric cost matrix to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Triangle {
    Lower,
    Upper,
    Full,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown matrix storage {0:?} (expected l, u or f)")]
pub struct UnknownTriangle(pub String);

impl FromStr for Triangle {
    type Err = UnknownTriangle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l" | "L" => Ok(Triangle::Lower),
            "u" | "U" => Ok(Triangle::Upper),
            "f" | "F" => Ok(Triangle::Full),
            _ => Err(UnknownTriangle(s.to_string())),
        }
    }
}

impl Triangle {
    #[inline]
    fn keeps(self, i: usize, j: usize) -> bool {
        match self {
            Triangle::Lower => i >= j,
            Triangle::Upper => i <= j,
            Triangle::Full => true,
        }
    }
}

/// The pieces of a problem the cost depends on.
#[derive(Clone, Copy, Debug)]
pub struct CostModel<'a> {
    pub mqm: &'a DMatrix<f64>,
    pub traj_order: usize,
    pub minimize_order: f64,
}

impl<'a> CostModel<'a> {
    pub fn of(problem: &'a TgProblem) -> Self {
        Self {
            mqm: &problem.mqm,
            traj_order: problem.trajectory_order,
            minimize_order: problem.minimize_order,
        }
    }

    /// Time weight `w(t)` applied to the MQM block of a segment.
    pub fn weight(&self, t: f64) -> f64 {
        let m = self.minimize_order;
        let (lo, hi) = (m.floor(), m.ceil());
        if lo == hi {
            t.powi(3 - 2 * hi as i32)
        } else {
            (m - lo) * t.powi(3 - 2 * hi as i32) + (hi - m) * t.powi(3 - 2 * lo as i32)
        }
    }

    /// `dw/dt`, term by term with `weight`.
    pub fn weight_deriv(&self, t: f64) -> f64 {
        let m = self.minimize_order;
        let (lo, hi) = (m.floor(), m.ceil());
        let term = |order: f64| (3.0 - 2.0 * order) * t.powi(2 - 2 * order as i32);
        if lo == hi {
            term(hi)
        } else {
            (m - lo) * term(hi) + (hi - m) * term(lo)
        }
    }

    fn layout(&self, segments: usize) -> Layout {
        Layout::new(self.traj_order, segments)
    }
}

/// Block-diagonal cost matrix `P` as triplets.
pub fn construct_p_matrix(
    model: &CostModel<'_>,
    room_time: &[f64],
    triangle: Triangle,
) -> SparseTriplets {
    let lay = model.layout(room_time.len());
    let blk = lay.per_axis();
    let per_block = match triangle {
        Triangle::Full => blk * blk,
        _ => blk * (blk + 1) / 2,
    };
    let nnz = room_time.len() * 3 * per_block;
    let mut out = SparseTriplets {
        triangle,
        val: Vec::with_capacity(nnz),
        row: Vec::with_capacity(nnz),
        col: Vec::with_capacity(nnz),
    };
    for (k, &t) in room_time.iter().enumerate() {
        let w = model.weight(t);
        for axis in 0..3 {
            for i in 0..blk {
                for j in 0..blk {
                    if triangle.keeps(i, j) {
                        out.row.push(lay.index(k, axis, i));
                        out.col.push(lay.index(k, axis, j));
                        out.val.push(model.mqm[(i, j)] * w);
                    }
                }
            }
        }
    }
    out
}

/// `∂(½ xᵀ P x)/∂tₖ` for every segment at a fixed solution `sol`.
pub fn gradient_from_p(
    model: &CostModel<'_>,
    room_time: &[f64],
    sol: &DVector<f64>,
) -> DVector<f64> {
    let lay = model.layout(room_time.len());
    let blk = lay.per_axis();
    DVector::from_fn(room_time.len(), |k, _| {
        let dw = model.weight_deriv(room_time[k]);
        let mut acc = 0.0;
        for axis in 0..3 {
            let base = lay.index(k, axis, 0);
            for i in 0..blk {
                for j in 0..blk {
                    acc += sol[base + i] * model.mqm[(i, j)] * sol[base + j];
                }
            }
        }
        0.5 * dw * acc
    })
}

/// Cost value and, if requested, its gradient with respect to
/// `[coef, room_time]` (length `ncoef + segments`).
#[derive(Clone, Debug)]
pub struct CostEval {
    pub cost: f64,
    pub grad: Option<DVector<f64>>,
}

pub fn eval_cost(
    model: &CostModel<'_>,
    coef: &DVector<f64>,
    room_time: &[f64],
    with_grad: bool,
) -> CostEval {
    let lay = model.layout(room_time.len());
    let blk = lay.per_axis();
    let n_coef = lay.n_coef();
    let mut grad = with_grad.then(|| DVector::zeros(n_coef + room_time.len()));
    let mut cost = 0.0;
    for (k, &t) in room_time.iter().enumerate() {
        let w = model.weight(t);
        let dw = model.weight_deriv(t);
        let mut djdt = 0.0;
        for axis in 0..3 {
            let base = lay.index(k, axis, 0);
            for i in 0..blk {
                let mut row_dot = 0.0;
                for j in 0..blk {
                    row_dot += model.mqm[(i, j)] * coef[base + j];
                }
                cost += 0.5 * w * coef[base + i] * row_dot;
                djdt += 0.5 * dw * coef[base + i] * row_dot;
                if let Some(g) = grad.as_mut() {
                    g[base + i] = w * row_dot;
                }
            }
        }
        if let Some(g) = grad.as_mut() {
            g[n_coef + k] = djdt;
        }
    }
    CostEval { cost, grad }
}
