//! Physical trajectory recovered from a solver's primal vector.
//!
//! The solver works on control points scaled by `1/tₖ`; a `Trajectory` holds
//! the unscaled control points per segment (`(order+1) × 3`, one column per
//! axis) and their monomial form on the normalized parameter `s ∈ [0, 1]`.

use nalgebra::{DMatrix, DVector, Vector3};
use thiserror::Error;

use crate::assembly::Layout;
use crate::bezier::bernstein_to_monomial;
use crate::problem::TgProblem;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrajectoryError {
    #[error("solution has {got} entries, expected {expected}")]
    SolutionLength { expected: usize, got: usize },
    #[error("trajectory needs at least one segment")]
    Empty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub order: usize,
    pub times: Vec<f64>,
    /// Physical control points per segment.
    pub ctrl: Vec<DMatrix<f64>>,
    mono: Vec<DMatrix<f64>>,
}

impl Trajectory {
    pub fn from_solution(problem: &TgProblem, sol: &DVector<f64>) -> Result<Self, TrajectoryError> {
        let lay = Layout::of(problem);
        if lay.segments == 0 {
            return Err(TrajectoryError::Empty);
        }
        if sol.len() != lay.n_coef() {
            return Err(TrajectoryError::SolutionLength {
                expected: lay.n_coef(),
                got: sol.len(),
            });
        }
        let times: Vec<f64> = problem.corridor.iter().map(|b| b.t).collect();
        let ctrl = times
            .iter()
            .enumerate()
            .map(|(k, &t)| {
                DMatrix::from_fn(lay.per_axis(), 3, |q, axis| sol[lay.index(k, axis, q)] * t)
            })
            .collect();
        Ok(Self::from_parts(problem.trajectory_order, times, ctrl))
    }

    fn from_parts(order: usize, times: Vec<f64>, ctrl: Vec<DMatrix<f64>>) -> Self {
        let m = bernstein_to_monomial(order);
        let mono = ctrl.iter().map(|c| &m * c).collect();
        Self {
            order,
            times,
            ctrl,
            mono,
        }
    }

    /// Scaled primal vector in the assembly layout.
    pub fn to_solution(&self) -> DVector<f64> {
        let lay = Layout::new(self.order, self.times.len());
        let mut sol = DVector::zeros(lay.n_coef());
        for (k, (c, &t)) in self.ctrl.iter().zip(&self.times).enumerate() {
            for axis in 0..3 {
                for q in 0..lay.per_axis() {
                    sol[lay.index(k, axis, q)] = c[(q, axis)] / t;
                }
            }
        }
        sol
    }

    /// Monomial coefficients (row `j` multiplies `sʲ`) per segment.
    pub fn monomial_coefficients(&self) -> &[DMatrix<f64>] {
        &self.mono
    }

    pub fn total_time(&self) -> f64 {
        self.times.iter().sum()
    }

    /// Position at `time`, clamped to `[0, total_time]`. Segment `i` owns
    /// `(Tᵢ₋₁, Tᵢ]`; the first segment also owns `0`.
    pub fn position(&self, time: f64) -> Vector3<f64> {
        let time = time.clamp(0.0, self.total_time());
        let mut start = 0.0;
        let last = self.times.len() - 1;
        for (k, &t) in self.times.iter().enumerate() {
            if time <= start + t || k == last {
                let s = ((time - start) / t).clamp(0.0, 1.0);
                return self.eval_segment(k, s);
            }
            start += t;
        }
        self.eval_segment(last, 1.0)
    }

    fn eval_segment(&self, k: usize, s: f64) -> Vector3<f64> {
        let a = &self.mono[k];
        Vector3::from_fn(|axis, _| {
            (0..a.nrows())
                .rev()
                .fold(0.0, |acc, j| acc * s + a[(j, axis)])
        })
    }

    /// `n` positions equally spaced in time over `[0, total_time]`.
    pub fn sample(&self, n: usize) -> (f64, Vec<Vector3<f64>>) {
        let total = self.total_time();
        let pts = match n {
            0 => Vec::new(),
            1 => vec![self.position(0.0)],
            _ => (0..n)
                .map(|i| self.position(total * i as f64 / (n - 1) as f64))
                .collect(),
        };
        (total, pts)
    }
}
