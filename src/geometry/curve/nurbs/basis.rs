//! Evaluates B-spline basis functions with the Cox-de Boor recurrence
//!
//! ```text
//! N(i,1)(u) = 1 if t(i) <= u <= t(i+1), else 0
//! N(i,k)(u) = (u - t(i)) / (t(i+k-1) - t(i)) * N(i,k-1)(u)
//!           + (t(i+k) - u) / (t(i+k) - t(i+1)) * N(i+1,k-1)(u)
//! ```
//!
//! where a term whose denominator is zero is defined to be zero.
//!
//! The order-1 case uses a closed interval. At an interior knot both adjacent
//! order-1 functions are non-zero, so the basis functions sum to more than
//! one there. The rational divide in [`evaluate_homogeneous`] callers cancels
//! the common factor for continuous curves, and the closed interval is what
//! makes the closing knot of a clamped curve evaluable.
//!
//! This is a reference evaluator with exponential cost in the order. Sample
//! counts are bounded by the subdivision strategies.

use crate::math::RationalPoint4;

/// Evaluates the `i`-th basis function of order `k` at `u`.
///
/// ## Arguments
///
/// - `knots` the knot vector
/// - `u` the curve parameter
/// - `i` the control point index
/// - `k` the order (degree + 1), at least 1
///
/// # Panics
///
/// Panics if `i + k` is not a valid index into `knots`.
#[allow(clippy::float_cmp)]
#[must_use]
pub(crate) fn basis(knots: &[f64], u: f64, i: usize, k: usize) -> f64 {
    if k <= 1 {
        return if knots[i] <= u && u <= knots[i + 1] {
            1.0
        } else {
            0.0
        };
    }

    let mut sum = 0.0;

    let div = knots[i + k - 1] - knots[i];
    if div != 0.0 {
        sum += (u - knots[i]) * basis(knots, u, i, k - 1) / div;
    }

    let div = knots[i + k] - knots[i + 1];
    if div != 0.0 {
        sum += (knots[i + k] - u) * basis(knots, u, i + 1, k - 1) / div;
    }

    sum
}

/// Evaluates the curve at `u` in homogeneous coordinates.
///
/// Sums `N(i,order)(u) * P(i)` over all control points. The caller performs
/// the divide by `w`.
#[must_use]
pub(crate) fn evaluate_homogeneous(
    u: f64,
    order: usize,
    knots: &[f64],
    control_points: &[RationalPoint4],
) -> RationalPoint4 {
    control_points
        .iter()
        .enumerate()
        .fold(RationalPoint4::zeros(), |acc, (i, p)| {
            acc + p * basis(knots, u, i, order)
        })
}
