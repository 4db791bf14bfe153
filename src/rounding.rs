//! Rounding policies used when building distance matrices.
//!
//! Each benchmark source rounds differently and results are only comparable
//! across implementations when these match exactly, so every policy lives here
//! under its own name.

/// Round to two decimal digits, halves away from zero.
///
/// Used for synthetic cost/time matrices and window bounds.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// TSPLIB `nint`: add 0.5 and drop the fractional part.
///
/// Used for `EUC_2D` distances, which are always non-negative.
#[inline]
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// TSPLIB `GEO` rounding: add 1.0 and drop the fractional part.
#[inline]
pub fn floor_plus_one(x: f64) -> f64 {
    (x + 1.0).floor()
}
