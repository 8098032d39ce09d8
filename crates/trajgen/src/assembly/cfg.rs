//! Assembly configuration.

/// Bound magnitude used for one-sided rows in the nonlinear evaluator.
pub const NLP_INF: f64 = 1e20;

/// Options for the gradient routines.
///
/// Replaces process-wide print/tolerance knobs; pass it explicitly.
#[derive(Clone, Copy, Debug)]
pub struct AssemblyCfg {
    /// Emit a `debug!` event for every multiplier with `|λ| > lmd_tol`.
    pub report_duals: bool,
    pub lmd_tol: f64,
}

impl Default for AssemblyCfg {
    fn default() -> Self {
        Self {
            report_duals: false,
            lmd_tol: 1e-4,
        }
    }
}
