use crate::error::{Result, TessellationError};

/// The distinct knot values partitioning a curve's active domain into spans.
///
/// Repeated knots (used to clamp endpoints or create sharp corners) collapse
/// to a single span boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct InterestingKnots {
    values: Vec<f64>,
}

impl InterestingKnots {
    /// Returns the distinct knot values in ascending order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of distinct values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether no values were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of evaluable spans.
    #[must_use]
    pub fn span_count(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    /// Returns the opening knot of the domain.
    #[must_use]
    pub fn first(&self) -> f64 {
        self.values.first().copied().unwrap_or(0.0)
    }

    /// Returns the closing knot of the domain.
    #[must_use]
    pub fn last(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }

    /// Returns the parametric length of the domain.
    #[must_use]
    pub fn domain_length(&self) -> f64 {
        self.last() - self.first()
    }

    /// Iterates over the `(start, end)` parameter pairs of each span.
    pub fn spans(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Extracts the interesting knots of a curve.
///
/// Scans `knots[order - 1..=num_points]`, the window covering the active
/// domain, and records every value that differs from the previously
/// recorded one.
///
/// # Errors
///
/// Returns [`TessellationError::AllocationFailed`] if the scratch buffer
/// cannot be allocated.
///
/// # Panics
///
/// Panics if `knots` is shorter than `num_points + 1` or `order` is zero.
/// [`NurbsCurve`](super::NurbsCurve) guarantees neither can happen.
#[allow(clippy::float_cmp)]
pub(crate) fn interesting_knots(knots: &[f64], num_points: usize, order: usize) -> Result<InterestingKnots> {
    let window = &knots[order - 1..=num_points];

    // Worst case: no repeats inside the window.
    let capacity = num_points + 2 - order;
    let mut values = Vec::new();
    values
        .try_reserve_exact(capacity)
        .map_err(|_| TessellationError::AllocationFailed { requested: capacity })?;

    for &knot in window {
        if values.last() != Some(&knot) {
            values.push(knot);
        }
    }

    Ok(InterestingKnots { values })
}
