//! Geometry defaults (internal).

/// Fraction of the axis extent each half extends past the midpoint when a box
/// is sliced in two; the children overlap by twice this amount.
pub const DEFAULT_OVERLAP: f64 = 0.1;
/// Tolerance for point-in-box checks.
pub(crate) const CONTAIN_EPS: f64 = 1e-9;
