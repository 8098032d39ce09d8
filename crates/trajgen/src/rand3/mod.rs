//! Random axis-aligned corridors for tests, benches and the CLI.
//!
//! Purpose
//! - Produce reproducible `TgProblem`s whose boxes chain along an
//!   axis-aligned random walk, so every consecutive pair overlaps.
//!
//! Why this design
//! - Determinism uses a replay token `(seed, index)` mixed into one `StdRng`;
//!   a streaming generator hands out tokens so any draw can be regenerated.
//! - Box `k` is the bounding box of the walk step `[pₖ, pₖ₊₁]` padded by
//!   `half_width`; its time is `step / speed`.
//!
//! Code cross-refs: `problem::TgProblem`, `bezier::mqm_for`.

use nalgebra::{Matrix2x3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::bezier::mqm_for;
use crate::geom::CorridorBox;
use crate::problem::{ProblemError, TgProblem};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("invalid corridor params: {reason}")]
    InvalidParams { reason: String },
    #[error("generated problem is inconsistent: {0}")]
    Problem(#[from] ProblemError),
}

impl GeneratorError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

/// Random-walk corridor configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorridorCfg {
    pub segments: usize,
    pub step_min: f64,
    pub step_max: f64,
    /// Padding added on every side of a walk step's bounding box.
    pub half_width: f64,
    /// Nominal speed used to allocate each segment's time.
    pub speed: f64,
    pub traj_order: usize,
    pub minimize_order: f64,
    pub margin: f64,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub limit_velocity: bool,
    pub limit_acceleration: bool,
}

impl Default for CorridorCfg {
    fn default() -> Self {
        Self {
            segments: 4,
            step_min: 1.0,
            step_max: 3.0,
            half_width: 0.5,
            speed: 2.0,
            traj_order: 5,
            minimize_order: 3.0,
            margin: 0.05,
            max_velocity: 4.0,
            max_acceleration: 6.0,
            limit_velocity: false,
            limit_acceleration: false,
        }
    }
}

impl CorridorCfg {
    fn validate(&self) -> Result<(), GeneratorError> {
        if self.segments == 0 {
            return Err(GeneratorError::invalid("need at least one segment"));
        }
        if self.step_min.is_nan()
            || self.step_min <= 0.0
            || self.step_min > self.step_max
            || !self.step_max.is_finite()
        {
            return Err(GeneratorError::invalid("0 < step_min <= step_max required"));
        }
        if !self.half_width.is_finite() || self.half_width <= 0.0 {
            return Err(GeneratorError::invalid("half_width must be finite and positive"));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(GeneratorError::invalid("speed must be finite and positive"));
        }
        if self.margin.is_nan() || self.margin < 0.0 || self.margin >= self.half_width {
            return Err(GeneratorError::invalid("0 <= margin < half_width required"));
        }
        Ok(())
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Walk vertices `p₀ … p_N`; consecutive steps never reuse an axis.
fn random_walk(cfg: &CorridorCfg, rng: &mut StdRng) -> Vec<Vector3<f64>> {
    let mut pts = Vec::with_capacity(cfg.segments + 1);
    let mut p = Vector3::zeros();
    pts.push(p);
    let mut prev_axis = None;
    for _ in 0..cfg.segments {
        let axis = loop {
            let a = rng.gen_range(0..3);
            if Some(a) != prev_axis {
                break a;
            }
        };
        prev_axis = Some(axis);
        let len = if cfg.step_max > cfg.step_min {
            rng.gen_range(cfg.step_min..cfg.step_max)
        } else {
            cfg.step_min
        };
        let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
        p[axis] += sign * len;
        pts.push(p);
    }
    pts
}

/// Draw one corridor problem from `cfg`, reproducible from `tok`.
pub fn draw_corridor(cfg: CorridorCfg, tok: ReplayToken) -> Result<TgProblem, GeneratorError> {
    cfg.validate()?;
    let mut rng = tok.to_std_rng();
    let pts = random_walk(&cfg, &mut rng);
    let corridor: Vec<CorridorBox> = pts
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0], w[1]);
            let bounds = [0, 1, 2].map(|i| {
                (
                    a[i].min(b[i]) - cfg.half_width,
                    a[i].max(b[i]) + cfg.half_width,
                )
            });
            let mut cell = CorridorBox::from_bounds(bounds);
            cell.t = (b - a).norm() / cfg.speed;
            cell
        })
        .collect();

    let mut position = Matrix2x3::zeros();
    let end = pts[pts.len() - 1];
    for axis in 0..3 {
        position[(1, axis)] = end[axis];
    }
    let problem = TgProblem::new(
        corridor,
        mqm_for(cfg.traj_order, cfg.minimize_order),
        position,
        Matrix2x3::zeros(),
        Matrix2x3::zeros(),
        cfg.max_velocity,
        cfg.max_acceleration,
        cfg.traj_order,
        cfg.minimize_order,
        cfg.margin,
        cfg.limit_velocity,
        cfg.limit_acceleration,
    );
    problem.validate()?;
    tracing::debug!(
        seed = tok.seed,
        index = tok.index,
        segments = problem.segments(),
        total_time = problem.total_time(),
        "drew corridor"
    );
    Ok(problem)
}

/// One streamed draw plus the token that regenerates it.
#[derive(Clone, Debug)]
pub struct CorridorSample {
    pub problem: TgProblem,
    pub replay: ReplayToken,
}

/// Streams corridors for a fixed seed with increasing replay index.
pub struct CorridorGenerator {
    cfg: CorridorCfg,
    seed: u64,
    next_index: u64,
}

impl CorridorGenerator {
    pub fn new(cfg: CorridorCfg, seed: u64) -> Result<Self, GeneratorError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            seed,
            next_index: 0,
        })
    }

    pub fn cfg(&self) -> &CorridorCfg {
        &self.cfg
    }

    pub fn generate_next(&mut self) -> Result<CorridorSample, GeneratorError> {
        let replay = ReplayToken {
            seed: self.seed,
            index: self.next_index,
        };
        self.next_index += 1;
        let problem = draw_corridor(self.cfg, replay)?;
        Ok(CorridorSample { problem, replay })
    }

    pub fn regenerate(&self, replay: &ReplayToken) -> Result<TgProblem, GeneratorError> {
        draw_corridor(self.cfg, *replay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::construct_a_matrix;

    fn tok(index: u64) -> ReplayToken {
        ReplayToken { seed: 7, index }
    }

    #[test]
    fn same_token_same_corridor() {
        let cfg = CorridorCfg::default();
        let a = draw_corridor(cfg, tok(3)).unwrap();
        let b = draw_corridor(cfg, tok(3)).unwrap();
        let c = draw_corridor(cfg, tok(4)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.corridor, c.corridor);
    }

    #[test]
    fn consecutive_boxes_overlap_and_endpoints_lie_inside() {
        let cfg = CorridorCfg {
            segments: 8,
            ..CorridorCfg::default()
        };
        for i in 0..16 {
            let p = draw_corridor(cfg, tok(i)).unwrap();
            assert_eq!(p.segments(), 8);
            for w in p.corridor.windows(2) {
                for axis in 0..3 {
                    let (a, b) = (w[0].bounds[axis], w[1].bounds[axis]);
                    assert!(a.0.max(b.0) < a.1.min(b.1), "axis {axis}: {a:?} {b:?}");
                }
            }
            let start = p.position.row(0).transpose();
            let end = p.position.row(1).transpose();
            assert!(p.corridor[0].contains_point(&start));
            assert!(p.corridor[7].contains_point(&end));
            assert!(p
                .corridor
                .iter()
                .all(|b| b.t >= cfg.step_min / cfg.speed - 1e-12));
        }
    }

    #[test]
    fn drawn_problem_assembles() {
        let p = draw_corridor(CorridorCfg::default(), tok(0)).unwrap();
        assert_eq!(p.mqm.shape(), (6, 6));
        let lc = construct_a_matrix(&p);
        assert_eq!(lc.n_var, p.n_var());
        assert_eq!(lc.equality_rows(), 9 + 9 + 9 * 3);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let bad = [
            CorridorCfg {
                segments: 0,
                ..CorridorCfg::default()
            },
            CorridorCfg {
                step_min: 4.0,
                ..CorridorCfg::default()
            },
            CorridorCfg {
                margin: 1.0,
                ..CorridorCfg::default()
            },
            CorridorCfg {
                margin: f64::NAN,
                ..CorridorCfg::default()
            },
            CorridorCfg {
                step_min: f64::NAN,
                ..CorridorCfg::default()
            },
            CorridorCfg {
                speed: f64::NAN,
                ..CorridorCfg::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(
                draw_corridor(cfg, tok(0)),
                Err(GeneratorError::InvalidParams { .. })
            ));
        }
        let low = CorridorCfg {
            traj_order: 1,
            ..CorridorCfg::default()
        };
        assert!(matches!(
            draw_corridor(low, tok(0)),
            Err(GeneratorError::Problem(ProblemError::OrderTooLow(1)))
        ));
    }

    #[test]
    fn generator_replays_streamed_samples() {
        let mut stream = CorridorGenerator::new(CorridorCfg::default(), 11).unwrap();
        let first = stream.generate_next().unwrap();
        let second = stream.generate_next().unwrap();
        assert_eq!(first.replay.index, 0);
        assert_eq!(second.replay.index, 1);
        assert_eq!(stream.regenerate(&second.replay).unwrap(), second.problem);
    }
}
