use crate::error::{Result, TessellationError};
use crate::geometry::NurbsCurve;

use super::vertex_buffer::VertexBuffer;
use super::{TessellationConfig, Vertex};

/// Splits every knot span into `segments` equal parameter steps.
///
/// The last vertex is evaluated directly at the closing knot instead of
/// being accumulated from increments.
#[allow(clippy::cast_precision_loss)]
pub(super) fn subdivide_constant(
    curve: &NurbsCurve,
    segments: usize,
    config: &TessellationConfig,
) -> Result<Vec<Vertex>> {
    let knots = curve.interesting_knots()?;
    let count = knots
        .span_count()
        .checked_mul(segments)
        .and_then(|n| n.checked_add(1))
        .ok_or(TessellationError::VertexLimitExceeded {
            limit: config.max_vertices,
        })?;
    let mut buffer = VertexBuffer::with_capacity(count, config)?;

    for (start, end) in knots.spans() {
        let increment = (end - start) / segments as f64;
        for i in 0..segments {
            let u = start + i as f64 * increment;
            buffer.push(Vertex::new(curve.point_at(u)?))?;
        }
    }
    buffer.push(Vertex::new(curve.point_at(knots.last())?))?;

    Ok(buffer.into_vec())
}

/// Emits one vertex per interesting knot.
pub(super) fn span_boundaries(curve: &NurbsCurve, config: &TessellationConfig) -> Result<Vec<Vertex>> {
    let knots = curve.interesting_knots()?;
    let mut buffer = VertexBuffer::with_capacity(knots.len(), config)?;
    for &u in knots.values() {
        buffer.push(Vertex::new(curve.point_at(u)?))?;
    }
    Ok(buffer.into_vec())
}
