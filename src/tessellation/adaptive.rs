//! Adaptive bisection shared by world-space and screen-space subdivision.
//!
//! Each knot span is walked from its start. A probe is placed at the end of
//! the span and pulled back by repeated halving until the chord from the
//! last accepted point fits the threshold. Distances are compared squared.
//!
//! When the step shrinks below the precision of the parameter values the
//! current candidate is accepted as-is, so the walk always terminates even
//! across discontinuities. A chord whose length is not finite, which a
//! degenerate view transform can produce, fails the call.

use tracing::debug;

use crate::error::{Result, TessellationError};
use crate::geometry::NurbsCurve;
use crate::math::{Matrix4, Point2, Point3};

use super::vertex_buffer::VertexBuffer;
use super::view::project_with;
use super::{TessellationConfig, Vertex};

/// Measures chord lengths for adaptive subdivision.
pub(crate) trait ChordMetric {
    /// The space distances are measured in.
    type Projected: Copy;

    /// Maps an evaluated curve point into the measuring space.
    fn project(&self, p: &Point3) -> Self::Projected;

    /// Returns the squared distance between two projected points.
    fn distance_squared(&self, a: &Self::Projected, b: &Self::Projected) -> f64;
}

/// Measures chords in object space.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WorldSpaceMetric;

impl ChordMetric for WorldSpaceMetric {
    type Projected = Point3;

    fn project(&self, p: &Point3) -> Point3 {
        *p
    }

    fn distance_squared(&self, a: &Point3, b: &Point3) -> f64 {
        (b - a).norm_squared()
    }
}

/// Measures chords in window coordinates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScreenSpaceMetric {
    world_to_window: Matrix4,
}

impl ScreenSpaceMetric {
    /// Creates a metric from a precomposed world-to-window matrix.
    #[must_use]
    pub(crate) fn new(world_to_window: Matrix4) -> Self {
        Self { world_to_window }
    }
}

impl ChordMetric for ScreenSpaceMetric {
    type Projected = Point2;

    fn project(&self, p: &Point3) -> Point2 {
        project_with(&self.world_to_window, p)
    }

    fn distance_squared(&self, a: &Point2, b: &Point2) -> f64 {
        (b - a).norm_squared()
    }
}

/// An accepted sample.
struct Sample<P> {
    parameter: f64,
    point: Point3,
    projected: P,
    forced: bool,
}

/// Subdivides `curve` so that consecutive points are at most `threshold`
/// apart under `metric`.
pub(super) fn subdivide_adaptive<M: ChordMetric>(
    curve: &NurbsCurve,
    metric: &M,
    threshold: f64,
    config: &TessellationConfig,
) -> Result<Vec<Vertex>> {
    let threshold_sq = threshold * threshold;
    let knots = curve.interesting_knots()?;
    let mut buffer = VertexBuffer::with_estimate(
        knots.span_count(),
        knots.domain_length(),
        threshold,
        config,
    )?;

    let start = curve.point_at(knots.first())?;
    let mut last = metric.project(&start);
    buffer.push(Vertex::new(start))?;

    let mut forced = 0_usize;
    for (span_start, span_end) in knots.spans() {
        let floor = f64::EPSILON * span_start.abs().max(span_end.abs()).max(1.0);
        let mut a = span_start;
        while a < span_end {
            let sample = bisect(curve, metric, &last, a, span_end, floor, threshold_sq)?;
            if sample.forced {
                forced += 1;
            }
            buffer.push(Vertex::new(sample.point))?;
            last = sample.projected;
            a = sample.parameter;
        }
    }

    if forced > 0 {
        debug!(
            forced,
            threshold, "accepted samples without reaching the chord threshold"
        );
    }
    Ok(buffer.into_vec())
}

/// Finds the next sample after `a` within `(a, span_end]`.
fn bisect<M: ChordMetric>(
    curve: &NurbsCurve,
    metric: &M,
    last: &M::Projected,
    a: f64,
    span_end: f64,
    floor: f64,
    threshold_sq: f64,
) -> Result<Sample<M::Projected>> {
    let mut step = span_end - a;
    let mut increasing = true;
    let mut b = a + step;

    loop {
        b = b.clamp(a, span_end);

        if b <= a {
            // The probe collapsed onto the last sample: restart closer.
            step *= 0.5;
            increasing = true;
            if step < floor {
                let b = (a + floor).min(span_end);
                let point = curve.point_at(b)?;
                return Ok(Sample {
                    parameter: b,
                    point,
                    projected: metric.project(&point),
                    forced: true,
                });
            }
            b = a + step;
            continue;
        }

        let point = curve.point_at(b)?;
        let projected = metric.project(&point);
        let distance_sq = metric.distance_squared(last, &projected);
        if !distance_sq.is_finite() {
            return Err(TessellationError::InvalidParameters(format!(
                "chord length at u = {b} is not finite under the view transform"
            ))
            .into());
        }
        if distance_sq <= threshold_sq {
            return Ok(Sample {
                parameter: b,
                point,
                projected,
                forced: false,
            });
        }

        if increasing {
            step *= 0.5;
        }
        increasing = false;
        if step < floor {
            return Ok(Sample {
                parameter: b,
                point,
                projected,
                forced: true,
            });
        }
        b -= step;
    }
}
