//! `TgProblem` and its validation.

use std::path::PathBuf;

use nalgebra::{DMatrix, DVector, Matrix2x3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::CorridorBox;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("corridor is empty")]
    EmptyCorridor,
    #[error("trajectory order {0} is below 2")]
    OrderTooLow(usize),
    #[error("MQM is {rows}x{cols}, expected {expected}x{expected}")]
    MqmShape {
        rows: usize,
        cols: usize,
        expected: usize,
    },
    #[error("segment {index} has invalid time {t}")]
    BadTime { index: usize, t: f64 },
    #[error("minimize order {0} is below 1")]
    MinimizeOrder(f64),
    #[error("expected {expected} segment times, got {got}")]
    TimeCount { expected: usize, got: usize },
    #[error("reading or writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed problem file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A full trajectory-generation problem.
///
/// Boundary matrices hold the start state in row 0 and the end state in row 1,
/// one column per axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TgProblem {
    pub corridor: Vec<CorridorBox>,
    /// Cost block for one axis of one segment, `(order+1) × (order+1)`.
    pub mqm: DMatrix<f64>,
    pub position: Matrix2x3<f64>,
    pub velocity: Matrix2x3<f64>,
    pub acceleration: Matrix2x3<f64>,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub trajectory_order: usize,
    /// Derivative order whose squared integral is minimized; fractional
    /// values blend the neighbouring integer orders.
    pub minimize_order: f64,
    /// Safety margin subtracted from box bounds (all segments but the first).
    pub margin: f64,
    pub limit_velocity: bool,
    pub limit_acceleration: bool,
}

impl Default for TgProblem {
    fn default() -> Self {
        Self {
            corridor: Vec::new(),
            mqm: DMatrix::zeros(0, 0),
            position: Matrix2x3::zeros(),
            velocity: Matrix2x3::zeros(),
            acceleration: Matrix2x3::zeros(),
            max_velocity: 0.0,
            max_acceleration: 0.0,
            trajectory_order: 0,
            minimize_order: 0.0,
            margin: 0.0,
            limit_velocity: false,
            limit_acceleration: false,
        }
    }
}

impl TgProblem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        corridor: Vec<CorridorBox>,
        mqm: DMatrix<f64>,
        position: Matrix2x3<f64>,
        velocity: Matrix2x3<f64>,
        acceleration: Matrix2x3<f64>,
        max_velocity: f64,
        max_acceleration: f64,
        trajectory_order: usize,
        minimize_order: f64,
        margin: f64,
        limit_velocity: bool,
        limit_acceleration: bool,
    ) -> Self {
        Self {
            corridor,
            mqm,
            position,
            velocity,
            acceleration,
            max_velocity,
            max_acceleration,
            trajectory_order,
            minimize_order,
            margin,
            limit_velocity,
            limit_acceleration,
        }
    }

    /// Check the preconditions that assembly relies on without re-checking.
    pub fn validate(&self) -> Result<(), ProblemError> {
        if self.corridor.is_empty() {
            return Err(ProblemError::EmptyCorridor);
        }
        if self.trajectory_order < 2 {
            return Err(ProblemError::OrderTooLow(self.trajectory_order));
        }
        let expected = self.trajectory_order + 1;
        if self.mqm.nrows() != expected || self.mqm.ncols() != expected {
            return Err(ProblemError::MqmShape {
                rows: self.mqm.nrows(),
                cols: self.mqm.ncols(),
                expected,
            });
        }
        if let Some((index, b)) = self
            .corridor
            .iter()
            .enumerate()
            .find(|(_, b)| !b.t.is_finite() || b.t <= 0.0)
        {
            return Err(ProblemError::BadTime { index, t: b.t });
        }
        if self.minimize_order.is_nan() || self.minimize_order < 1.0 {
            return Err(ProblemError::MinimizeOrder(self.minimize_order));
        }
        Ok(())
    }

    #[inline]
    pub fn segments(&self) -> usize {
        self.corridor.len()
    }

    /// Number of control-point variables: `segments * 3 * (order + 1)`.
    #[inline]
    pub fn n_var(&self) -> usize {
        self.segments() * 3 * (self.trajectory_order + 1)
    }

    pub fn room_times(&self) -> DVector<f64> {
        DVector::from_iterator(self.segments(), self.corridor.iter().map(|b| b.t))
    }

    pub fn total_time(&self) -> f64 {
        self.corridor.iter().map(|b| b.t).sum()
    }

    /// Overwrite every segment's allocated time.
    pub fn update_corridor_time(&mut self, times: &[f64]) -> Result<(), ProblemError> {
        if times.len() != self.corridor.len() {
            return Err(ProblemError::TimeCount {
                expected: self.corridor.len(),
                got: times.len(),
            });
        }
        for (b, &t) in self.corridor.iter_mut().zip(times) {
            b.t = t;
        }
        Ok(())
    }
}

/// Field-by-field comparison; logs the first mismatch at debug level.
pub fn same_problem(a: &TgProblem, b: &TgProblem) -> bool {
    if a.mqm.shape() != b.mqm.shape() {
        tracing::debug!(a = ?a.mqm.shape(), b = ?b.mqm.shape(), "MQM shape differs");
        return false;
    }
    let mqm_diff = (&a.mqm - &b.mqm).norm();
    if mqm_diff != 0.0 {
        tracing::debug!(mqm_diff, "MQM differs");
        return false;
    }
    if a.corridor != b.corridor {
        tracing::debug!(a = a.corridor.len(), b = b.corridor.len(), "corridor differs");
        return false;
    }
    let same = a == b;
    if !same {
        tracing::debug!("boundary conditions, limits or flags differ");
    }
    same
}
