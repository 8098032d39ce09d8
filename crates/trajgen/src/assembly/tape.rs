//! Sparse builders and the immutable constraint snapshot handed to solvers.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::cost::Triangle;

/// Accumulates sparse rows and per-row (or per-variable) bounds.
#[derive(Clone, Debug, Default)]
pub struct ConstraintTape {
    pub row: Vec<usize>,
    pub col: Vec<usize>,
    pub val: Vec<f64>,
    pub lb: Vec<f64>,
    pub ub: Vec<f64>,
    pub n_bound: usize,
    pub a_nnz: usize,
    pub a_row: usize,
}

impl ConstraintTape {
    pub fn add_bound(&mut self, l: f64, u: f64) {
        self.lb.push(l);
        self.ub.push(u);
        self.n_bound += 1;
    }

    /// Append one sparse row; `cols` and `vals` are parallel.
    pub fn put_row(&mut self, row_idx: usize, cols: &[usize], vals: &[f64]) {
        debug_assert_eq!(cols.len(), vals.len());
        for (&c, &v) in cols.iter().zip(vals) {
            self.row.push(row_idx);
            self.col.push(c);
            self.val.push(v);
        }
        self.a_row += 1;
        self.a_nnz += cols.len();
    }
}

/// Linear constraints `clb <= A x <= cub`, `xlb <= x <= xub`, with `A` as
/// `(arow, acol, aval)` triplets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearConstr {
    pub xlb: DVector<f64>,
    pub xub: DVector<f64>,
    pub clb: DVector<f64>,
    pub cub: DVector<f64>,
    pub aval: DVector<f64>,
    pub arow: Vec<usize>,
    pub acol: Vec<usize>,
    pub n_var: usize,
    pub n_con: usize,
    pub n_nnz: usize,
}

/// Per-row shortfalls (`<= 0`, zero when satisfied).
#[derive(Clone, Debug)]
pub struct Violations {
    pub constraint: DVector<f64>,
    pub bound: DVector<f64>,
}

impl Violations {
    pub fn worst(&self) -> f64 {
        self.constraint
            .iter()
            .chain(self.bound.iter())
            .fold(0.0_f64, |acc, &v| acc.min(v))
    }
}

impl LinearConstr {
    pub fn from_tapes(con: ConstraintTape, var: ConstraintTape) -> Self {
        let n_var = var.lb.len();
        let n_con = con.lb.len();
        let n_nnz = con.val.len();
        Self {
            xlb: DVector::from_vec(var.lb),
            xub: DVector::from_vec(var.ub),
            clb: DVector::from_vec(con.lb),
            cub: DVector::from_vec(con.ub),
            aval: DVector::from_vec(con.val),
            arow: con.row,
            acol: con.col,
            n_var,
            n_con,
            n_nnz,
        }
    }

    /// `A x`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut out = DVector::zeros(self.n_con);
        for ((&r, &c), &v) in self.arow.iter().zip(&self.acol).zip(self.aval.iter()) {
            out[r] += v * x[c];
        }
        out
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut a = DMatrix::zeros(self.n_con, self.n_var);
        for ((&r, &c), &v) in self.arow.iter().zip(&self.acol).zip(self.aval.iter()) {
            a[(r, c)] += v;
        }
        a
    }

    pub fn equality_rows(&self) -> usize {
        self.clb.iter().zip(self.cub.iter()).filter(|(l, u)| l == u).count()
    }

    pub fn inequality_rows(&self) -> usize {
        self.n_con - self.equality_rows()
    }

    /// How far `x` falls outside each constraint row and variable bound.
    pub fn violations(&self, x: &DVector<f64>) -> Violations {
        let ax = self.mul_vec(x);
        let constraint = DVector::from_fn(self.n_con, |i, _| {
            (ax[i] - self.clb[i]).min(0.0).min((self.cub[i] - ax[i]).min(0.0))
        });
        let bound = DVector::from_fn(self.n_var, |i, _| {
            (x[i] - self.xlb[i]).min(0.0).min((self.xub[i] - x[i]).min(0.0))
        });
        Violations { constraint, bound }
    }
}

/// Symmetric sparse matrix stored as triplets of the requested triangle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseTriplets {
    pub triangle: Triangle,
    pub val: Vec<f64>,
    pub row: Vec<usize>,
    pub col: Vec<usize>,
}

impl SparseTriplets {
    pub fn nnz(&self) -> usize {
        self.val.len()
    }

    /// Full symmetric matrix of dimension `n`.
    pub fn to_dense(&self, n: usize) -> DMatrix<f64> {
        let mut m = DMatrix::zeros(n, n);
        for ((&r, &c), &v) in self.row.iter().zip(&self.col).zip(&self.val) {
            m[(r, c)] += v;
            if self.triangle != Triangle::Full && r != c {
                m[(c, r)] += v;
            }
        }
        m
    }

    /// `½ xᵀ P x`.
    pub fn quad_form(&self, x: &DVector<f64>) -> f64 {
        let mut acc = 0.0;
        for ((&r, &c), &v) in self.row.iter().zip(&self.col).zip(&self.val) {
            let w = if self.triangle != Triangle::Full && r != c {
                2.0
            } else {
                1.0
            };
            acc += w * v * x[r] * x[c];
        }
        0.5 * acc
    }
}
