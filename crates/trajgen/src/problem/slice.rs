//! Corridor slicing: more segments without touching the end cells.
//!
//! With `n + 2` boxes and `k` requested slices, each of the `n` middle boxes
//! is split once per pass (2nd box, then the original 3rd, ...). When a pass
//! has visited every middle box the cursor restarts at index 1 over the grown
//! corridor until `k` splits are done. E.g. `n = 2, k = 3`: slice the 2nd
//! box, then the original 3rd, then the (new) 2nd again.

use thiserror::Error;

use super::types::TgProblem;
use crate::geom::{Axis, GeomError, DEFAULT_OVERLAP};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SliceError {
    #[error("cannot slice a corridor with {0} segments (need more than 2)")]
    TooShort(usize),
    #[error("got {got} slice directions for {expected} segments")]
    DirectionCount { expected: usize, got: usize },
    #[error("slice count must be positive")]
    ZeroTimes,
    #[error("cannot slice box {index}: {source}")]
    Box {
        index: usize,
        #[source]
        source: GeomError,
    },
}

/// Split middle boxes of `problem.corridor` round-robin, `slice_times` times.
///
/// `directions[i]` is the axis (`x`/`y`/`z`, any case) used for box `i`.
/// Returns the direction list grown alongside the corridor. Every middle
/// direction is checked before the first split, so a rejected request leaves
/// `problem` untouched.
pub fn slice_corridor(
    problem: &mut TgProblem,
    directions: &[char],
    slice_times: usize,
) -> Result<Vec<char>, SliceError> {
    let corridor = &mut problem.corridor;
    tracing::debug!(segments = corridor.len(), slice_times, "slice corridor");

    if corridor.len() <= 2 {
        tracing::error!(segments = corridor.len(), "corridor too short to slice");
        return Err(SliceError::TooShort(corridor.len()));
    }
    if corridor.len() != directions.len() {
        tracing::error!(
            segments = corridor.len(),
            directions = directions.len(),
            "direction count mismatch"
        );
        return Err(SliceError::DirectionCount {
            expected: corridor.len(),
            got: directions.len(),
        });
    }
    if slice_times == 0 {
        tracing::error!("slice count must be positive");
        return Err(SliceError::ZeroTimes);
    }
    let last = directions.len() - 1;
    for (index, &c) in directions.iter().enumerate().take(last).skip(1) {
        Axis::try_from(c).map_err(|source| {
            tracing::error!(index, %source, "cannot slice box");
            SliceError::Box { index, source }
        })?;
    }

    let mut directions = directions.to_vec();
    let mut pass_len = corridor.len();
    let mut which = 1;
    let mut local = 0;

    for _ in 0..slice_times {
        tracing::debug!(which, "slicing");
        let axis = directions[which];
        let (first, second) = corridor[which]
            .split(axis, DEFAULT_OVERLAP)
            .map_err(|source| {
                tracing::error!(index = which, %source, "cannot slice box");
                SliceError::Box {
                    index: which,
                    source,
                }
            })?;
        corridor[which] = first;
        corridor.insert(which + 1, second);
        directions.insert(which, axis);

        which += 2;
        local += 1;
        if local >= pass_len - 2 {
            local = 0;
            which = 1;
            pass_len = corridor.len();
            tracing::info!(segments = pass_len, "every middle box sliced, starting over");
        }
    }
    tracing::debug!(directions = %directions.iter().collect::<String>(), "slice directions");
    Ok(directions)
}
