//! JSON persistence for `TgProblem`.
//!
//! Bounds are derived data: every load re-runs `CorridorBox::set_box()` so the
//! in-memory bounds always agree with the stored corners, whatever the file says.

use std::fs;
use std::path::Path;

use super::types::{ProblemError, TgProblem};

impl TgProblem {
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ProblemError> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| ProblemError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| ProblemError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        fs::write(path, bytes).map_err(|source| ProblemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), segments = self.segments(), "saved problem");
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ProblemError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ProblemError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut problem: TgProblem =
            serde_json::from_slice(&bytes).map_err(|source| ProblemError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        for b in &mut problem.corridor {
            b.set_box();
        }
        tracing::debug!(path = %path.display(), segments = problem.segments(), "loaded problem");
        Ok(problem)
    }
}
