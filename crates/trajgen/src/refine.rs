//! Segment-time refinement by projected backtracking gradient descent.
//!
//! The outer loop is solver-agnostic: callers pass a closure that solves the
//! fixed-time problem for given segment times and returns the optimal cost
//! `J(t)` plus `∂J/∂t` (typically from `assembly::time_gradient` with
//! `tf_weight = 0`). The refined objective is `J(t) + tf_weight · Σ tₖ`;
//! with `tf_weight == 0` the total time is held fixed by projecting every
//! step onto `Σ tₖ = const`.
//!
//! Code cross-refs: `assembly::time_gradient`, `TgProblem::update_corridor_time`.

use nalgebra::DVector;
use thiserror::Error;

use crate::problem::{ProblemError, TgProblem};

/// Times below this are never handed to the solver.
pub const MIN_SEGMENT_TIME: f64 = 1e-6;

/// Where the descent direction comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientMethod {
    /// Gradient returned by the solve closure.
    Analytic,
    /// Forward differences, one extra solve per segment.
    ForwardDiff,
    /// Forward differences along `eᵢ - (1 - eᵢ)/(m - 1)`, which keep the
    /// total time fixed (Mellinger and Kumar). Falls back to `ForwardDiff`
    /// for a single segment.
    Mellinger,
}

#[derive(Clone, Copy, Debug)]
pub struct RefineCfg {
    /// Initial step length of each line search.
    pub alpha0: f64,
    /// Sufficient-decrease factor.
    pub c: f64,
    /// Step shrink factor.
    pub tau: f64,
    pub max_iter: usize,
    /// Line-search trials per iteration.
    pub j_iter: usize,
    pub grad_tol: f64,
    pub abs_obj_tol: f64,
    pub rel_obj_tol: f64,
    /// Weight of the total time in the objective.
    pub tf_weight: f64,
    pub gradient: GradientMethod,
    /// Step of the finite-difference methods.
    pub fd_step: f64,
}

impl Default for RefineCfg {
    fn default() -> Self {
        Self {
            alpha0: 0.175,
            c: 0.2,
            tau: 0.2,
            max_iter: 50,
            j_iter: 5,
            grad_tol: 1e-3,
            abs_obj_tol: 1e-3,
            rel_obj_tol: 1e-3,
            tf_weight: 0.0,
            gradient: GradientMethod::Analytic,
            fd_step: 0.25e-6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// One segment with a fixed total time has nothing to refine.
    NothingToRefine,
    SmallGradient,
    AbsoluteCost,
    RelativeCost,
    /// No trial step decreased the objective; times stay at the last iterate.
    NoStep,
    MaxIter,
}

#[derive(Clone, Debug)]
pub struct RefineReport {
    pub times: Vec<f64>,
    /// `J(t) + tf_weight · Σ t` at `times`; NaN when nothing was solved.
    pub objective: f64,
    pub iterations: usize,
    pub solves: usize,
    pub reason: StopReason,
}

impl RefineReport {
    pub fn converged(&self) -> bool {
        !matches!(self.reason, StopReason::NoStep | StopReason::MaxIter)
    }
}

#[derive(Debug, Error)]
pub enum RefineError<E: std::error::Error + 'static> {
    #[error("solve at the current times failed: {0}")]
    Solve(#[source] E),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

/// `∂J/∂tᵢ ≈ (J(t + h eᵢ) - J(t)) / h`, with `j0 = J(t)`.
pub fn fd_time_gradient<E, F>(solve: &mut F, times: &[f64], j0: f64, h: f64) -> Result<DVector<f64>, E>
where
    F: FnMut(&[f64]) -> Result<(f64, DVector<f64>), E>,
{
    let mut grad = DVector::zeros(times.len());
    let mut trial = times.to_vec();
    for i in 0..times.len() {
        trial[i] += h;
        grad[i] = (solve(&trial)?.0 - j0) / h;
        trial[i] = times[i];
    }
    Ok(grad)
}

/// Directional differences along `gᵢ = eᵢ - (1 - eᵢ)/(m - 1)`; needs `m >= 2`.
pub fn mellinger_time_gradient<E, F>(
    solve: &mut F,
    times: &[f64],
    j0: f64,
    h: f64,
) -> Result<DVector<f64>, E>
where
    F: FnMut(&[f64]) -> Result<(f64, DVector<f64>), E>,
{
    let m = times.len();
    if m < 2 {
        return fd_time_gradient(solve, times, j0, h);
    }
    let off = -1.0 / (m - 1) as f64;
    let mut grad = DVector::zeros(m);
    for i in 0..m {
        let trial: Vec<f64> = times
            .iter()
            .enumerate()
            .map(|(j, &t)| t + h * if j == i { 1.0 } else { off })
            .collect();
        grad[i] = (solve(&trial)?.0 - j0) / h;
    }
    Ok(grad)
}

/// Refine `problem`'s segment times in place.
///
/// Candidate solves that fail (or return a negative or non-finite cost)
/// shrink the step like an insufficient decrease; only a failure at the
/// accepted iterate is returned as an error.
pub fn refine_times<E, F>(
    problem: &mut TgProblem,
    mut solve: F,
    cfg: &RefineCfg,
) -> Result<RefineReport, RefineError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut(&[f64]) -> Result<(f64, DVector<f64>), E>,
{
    let n = problem.segments();
    let mut t_now: Vec<f64> = problem.corridor.iter().map(|b| b.t).collect();
    let total = |t: &[f64]| cfg.tf_weight * t.iter().sum::<f64>();

    if n == 1 && cfg.tf_weight == 0.0 {
        return Ok(RefineReport {
            times: t_now,
            objective: f64::NAN,
            iterations: 0,
            solves: 0,
            reason: StopReason::NothingToRefine,
        });
    }

    let (mut j_now, mut g_now) = solve(&t_now).map_err(RefineError::Solve)?;
    let mut solves = 1;
    let mut obj0 = j_now + total(&t_now);
    let mut reason = StopReason::MaxIter;
    let mut iterations = cfg.max_iter;

    for iter in 0..cfg.max_iter {
        let mut grad = match cfg.gradient {
            GradientMethod::Analytic => g_now.clone(),
            GradientMethod::ForwardDiff => {
                solves += n;
                fd_time_gradient(&mut solve, &t_now, j_now, cfg.fd_step)
                    .map_err(RefineError::Solve)?
            }
            GradientMethod::Mellinger => {
                solves += n;
                mellinger_time_gradient(&mut solve, &t_now, j_now, cfg.fd_step)
                    .map_err(RefineError::Solve)?
            }
        };
        grad.add_scalar_mut(cfg.tf_weight);
        if cfg.tf_weight == 0.0 {
            let mean = grad.mean();
            grad.add_scalar_mut(-mean);
        }
        let norm = grad.norm();
        if norm < cfg.grad_tol {
            reason = StopReason::SmallGradient;
            iterations = iter;
            break;
        }

        let p = grad / -norm;
        let alpha_max = t_now
            .iter()
            .zip(p.iter())
            .filter(|(_, &pi)| pi != 0.0)
            .map(|(&t, &pi)| -t / pi)
            .fold(f64::NEG_INFINITY, f64::max)
            - MIN_SEGMENT_TIME;
        let mut alpha = if alpha_max > 0.0 {
            alpha_max.min(cfg.alpha0)
        } else {
            cfg.alpha0
        };
        let decrease = cfg.c * norm;

        let mut accepted = None;
        for _ in 0..cfg.j_iter {
            let cand: Vec<f64> = t_now.iter().zip(p.iter()).map(|(t, pi)| t + alpha * pi).collect();
            if cand.iter().any(|&t| t < MIN_SEGMENT_TIME) {
                alpha *= cfg.tau;
                continue;
            }
            solves += 1;
            match solve(&cand) {
                Ok((j, g)) if j.is_finite() && j >= 0.0 => {
                    let objf = j + total(&cand);
                    if obj0 - objf >= alpha * decrease || obj0 - objf >= 0.1 * obj0 {
                        accepted = Some((cand, j, g, objf));
                        break;
                    }
                }
                Ok((j, _)) => tracing::debug!(alpha, cost = j, "rejected trial cost"),
                Err(e) => tracing::debug!(alpha, error = %e, "trial solve failed"),
            }
            alpha *= cfg.tau;
        }

        let Some((cand, j, g, objf)) = accepted else {
            tracing::debug!(iter, "no step length found");
            reason = StopReason::NoStep;
            iterations = iter;
            break;
        };
        tracing::debug!(iter, alpha, objective = objf, "accepted step");
        let prev = obj0;
        t_now = cand;
        j_now = j;
        g_now = g;
        obj0 = objf;
        if (objf - prev).abs() < cfg.abs_obj_tol {
            reason = StopReason::AbsoluteCost;
            iterations = iter + 1;
            break;
        }
        if (objf - prev).abs() / prev.abs() < cfg.rel_obj_tol {
            reason = StopReason::RelativeCost;
            iterations = iter + 1;
            break;
        }
    }

    problem.update_corridor_time(&t_now)?;
    tracing::info!(?reason, iterations, solves, objective = obj0, "refined segment times");
    Ok(RefineReport {
        times: t_now,
        objective: obj0,
        iterations,
        solves,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::three_segment_problem;

    #[derive(Debug, Error)]
    #[error("infeasible")]
    struct Infeasible;

    const WEIGHTS: [f64; 3] = [1.0, 4.0, 2.0];

    /// `J(t) = Σ aᵢ / tᵢ³`, minimized at fixed total time by `tᵢ ∝ aᵢ^¼`.
    fn cubic(t: &[f64]) -> Result<(f64, DVector<f64>), Infeasible> {
        let j = t.iter().zip(WEIGHTS).map(|(t, a)| a / t.powi(3)).sum();
        let g = DVector::from_iterator(t.len(), t.iter().zip(WEIGHTS).map(|(t, a)| -3.0 * a / t.powi(4)));
        Ok((j, g))
    }

    fn tight() -> RefineCfg {
        RefineCfg {
            max_iter: 200,
            grad_tol: 1e-6,
            abs_obj_tol: 0.0,
            rel_obj_tol: 0.0,
            ..RefineCfg::default()
        }
    }

    fn fixed_total_optimum(total: f64) -> Vec<f64> {
        let s: f64 = WEIGHTS.iter().map(|a| a.powf(0.25)).sum();
        WEIGHTS.iter().map(|a| a.powf(0.25) / s * total).collect()
    }

    #[test]
    fn fixed_total_time_reaches_analytic_optimum() {
        for gradient in [
            GradientMethod::Analytic,
            GradientMethod::ForwardDiff,
            GradientMethod::Mellinger,
        ] {
            let mut p = three_segment_problem();
            let start = cubic(&[1.0, 2.0, 1.5]).unwrap().0;
            let cfg = RefineCfg {
                gradient,
                fd_step: 1e-7,
                ..tight()
            };
            let report = refine_times(&mut p, cubic, &cfg).unwrap();
            assert!(report.objective < start);
            assert!((report.times.iter().sum::<f64>() - 4.5).abs() < 1e-9);
            for (t, o) in report.times.iter().zip(fixed_total_optimum(4.5)) {
                assert!((t - o).abs() < 1e-3, "{gradient:?}: {t} vs {o}");
            }
            assert_eq!(p.room_times().as_slice(), report.times.as_slice());
        }
    }

    #[test]
    fn time_weight_frees_the_total() {
        let mut p = three_segment_problem();
        let cfg = RefineCfg {
            tf_weight: 0.5,
            ..tight()
        };
        let report = refine_times(&mut p, cubic, &cfg).unwrap();
        // -3a/t⁴ + w = 0
        for (t, a) in report.times.iter().zip(WEIGHTS) {
            let o = (3.0 * a / 0.5).powf(0.25);
            assert!((t - o).abs() < 1e-3, "{t} vs {o}");
        }
    }

    #[test]
    fn loose_tolerances_stop_on_cost_change() {
        let mut p = three_segment_problem();
        let report = refine_times(&mut p, cubic, &RefineCfg::default()).unwrap();
        assert!(report.converged());
        assert!(matches!(
            report.reason,
            StopReason::AbsoluteCost | StopReason::RelativeCost | StopReason::SmallGradient
        ));
        assert!(report.iterations <= RefineCfg::default().max_iter);
    }

    #[test]
    fn single_segment_with_fixed_total_is_left_alone() {
        let mut p = three_segment_problem();
        p.corridor.truncate(1);
        let mut calls = 0;
        let report = refine_times(
            &mut p,
            |t: &[f64]| {
                calls += 1;
                cubic(t)
            },
            &RefineCfg::default(),
        )
        .unwrap();
        assert_eq!(report.reason, StopReason::NothingToRefine);
        assert_eq!(report.solves, 0);
        assert_eq!(calls, 0);
    }

    #[test]
    fn failing_trials_keep_current_times() {
        let mut p = three_segment_problem();
        let start = p.room_times();
        let mut first = true;
        let report = refine_times(
            &mut p,
            |t: &[f64]| {
                if std::mem::take(&mut first) {
                    cubic(t)
                } else {
                    Err(Infeasible)
                }
            },
            &RefineCfg::default(),
        )
        .unwrap();
        assert_eq!(report.reason, StopReason::NoStep);
        assert!(!report.converged());
        assert_eq!(p.room_times(), start);
        assert_eq!(report.solves, 1 + RefineCfg::default().j_iter);
    }

    #[test]
    fn failure_at_start_is_an_error() {
        let mut p = three_segment_problem();
        let err = refine_times(&mut p, |_: &[f64]| Err::<(f64, DVector<f64>), _>(Infeasible), &RefineCfg::default())
            .unwrap_err();
        assert!(matches!(err, RefineError::Solve(Infeasible)));
    }

    #[test]
    fn difference_gradients_match_analytic() {
        let t = [1.0, 2.0, 1.5];
        let (j0, g) = cubic(&t).unwrap();
        let mut solve = cubic;
        let fd = fd_time_gradient(&mut solve, &t, j0, 1e-7).unwrap();
        assert!((&fd - &g).norm() < 1e-5 * g.norm());
        // Mellinger directions see the gradient projected onto Σ t = const,
        // scaled by m / (m - 1).
        let mel = mellinger_time_gradient(&mut solve, &t, j0, 1e-7).unwrap();
        let projected = g.add_scalar(-g.mean()) * 1.5;
        assert!((&mel - &projected).norm() < 1e-5 * g.norm());
    }
}
