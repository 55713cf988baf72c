//! Culture hook for rendering scalars as text.

use super::Scalar;

/// Supplies culture-specific text for scalar values.
///
/// Consulted for the rendered message and for property columns written with
/// [`PropertyWriteMethod::ToStringFormatted`](crate::column::PropertyWriteMethod).
/// Returning `None` falls back to the invariant rendering.
pub trait FormatProvider: Send + Sync {
    fn format_scalar(&self, scalar: &Scalar, format: Option<&str>) -> Option<String>;
}
