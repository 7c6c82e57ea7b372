mod basis;
mod knots;

pub use knots::InterestingKnots;

use std::any::Any;

use crate::attribute::{duplicate_opt, share_opt, SharedAttributes};
use crate::error::{GeometryError, Result};
use crate::geometry::{Geometry, GeometryKind};
use crate::math::{dehomogenize, Aabb, Point3, RationalPoint4, TOLERANCE};
use crate::tessellation::{
    Polyline, SubdivisionPolicy, SubdivisionStyle, TessellateCurve, ViewTransform,
};

use super::{Curve, CurveDomain};
use knots::interesting_knots;

/// Raw rational B-spline curve data as supplied by, and handed back to,
/// callers.
///
/// `knots` must hold `control_points.len() + order` values. The data is
/// validated when it is turned into a [`NurbsCurve`].
#[derive(Debug, Default)]
pub struct NurbsCurveData {
    /// Order of the curve (degree + 1).
    pub order: usize,
    /// Homogeneous control points.
    pub control_points: Vec<RationalPoint4>,
    /// Non-decreasing knot vector.
    pub knots: Vec<f64>,
    /// Optional attribute set applied to the whole curve.
    pub attributes: Option<SharedAttributes>,
}

impl NurbsCurveData {
    /// Creates curve data without attributes.
    #[must_use]
    pub fn new(order: usize, control_points: Vec<RationalPoint4>, knots: Vec<f64>) -> Self {
        Self {
            order,
            control_points,
            knots,
            attributes: None,
        }
    }

    /// Attaches an attribute set.
    #[must_use]
    pub fn with_attributes(mut self, attributes: SharedAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Returns the number of control points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.control_points.len()
    }
}

/// A validated non-uniform rational B-spline curve.
///
/// The curve owns its control points and knots. Every mutation bumps the
/// [`generation`](Self::generation) counter so hosts caching derived data
/// (such as tessellations) can detect edits.
#[derive(Debug)]
pub struct NurbsCurve {
    order: usize,
    control_points: Vec<RationalPoint4>,
    knots: Vec<f64>,
    attributes: Option<SharedAttributes>,
    generation: u64,
}

impl NurbsCurve {
    /// Creates a new curve.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidGeometry`] if `order < 2`, there are
    /// fewer control points than the order, the knot vector has the wrong
    /// length, is decreasing or non-finite, spans an empty domain, or a
    /// control point has a non-positive or non-finite weight.
    pub fn new(order: usize, control_points: Vec<RationalPoint4>, knots: Vec<f64>) -> Result<Self> {
        validate(order, &control_points, &knots)?;
        Ok(Self {
            order,
            control_points,
            knots,
            attributes: None,
            generation: 0,
        })
    }

    /// Creates a curve from a deep copy of `data`.
    ///
    /// The attribute set, if any, is shared rather than duplicated.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a valid curve (see [`Self::new`]).
    pub fn from_data(data: &NurbsCurveData) -> Result<Self> {
        let mut curve = Self::new(data.order, data.control_points.clone(), data.knots.clone())?;
        curve.attributes = share_opt(data.attributes.as_ref());
        Ok(curve)
    }

    /// Copies the curve out into caller-owned data, sharing the attribute set.
    #[must_use]
    pub fn get_data(&self) -> NurbsCurveData {
        NurbsCurveData {
            order: self.order,
            control_points: self.control_points.clone(),
            knots: self.knots.clone(),
            attributes: share_opt(self.attributes.as_ref()),
        }
    }

    /// Replaces the whole curve definition.
    ///
    /// The curve is left untouched if `data` is invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not a valid curve (see [`Self::new`]).
    pub fn set_data(&mut self, data: &NurbsCurveData) -> Result<()> {
        validate(data.order, &data.control_points, &data.knots)?;
        self.order = data.order;
        self.control_points.clone_from(&data.control_points);
        self.knots.clone_from(&data.knots);
        self.attributes = share_opt(data.attributes.as_ref());
        self.edited();
        Ok(())
    }

    /// Returns an independent copy with a duplicated attribute set.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            order: self.order,
            control_points: self.control_points.clone(),
            knots: self.knots.clone(),
            attributes: duplicate_opt(self.attributes.as_ref()),
            generation: 0,
        }
    }

    /// Returns the order (degree + 1).
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the number of control points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.control_points.len()
    }

    /// Returns the knot vector.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Returns the homogeneous control points.
    #[must_use]
    pub fn control_points(&self) -> &[RationalPoint4] {
        &self.control_points
    }

    /// Returns the edit counter.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the control point at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexOutOfRange`] for an invalid index.
    pub fn control_point(&self, index: usize) -> Result<&RationalPoint4> {
        self.control_points.get(index).ok_or_else(|| {
            GeometryError::IndexOutOfRange {
                what: "control point",
                index,
                len: self.control_points.len(),
            }
            .into()
        })
    }

    /// Replaces the control point at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid index or a point with a non-positive
    /// or non-finite weight.
    pub fn set_control_point(&mut self, index: usize, point: RationalPoint4) -> Result<()> {
        let len = self.control_points.len();
        let slot = self
            .control_points
            .get_mut(index)
            .ok_or(GeometryError::IndexOutOfRange {
                what: "control point",
                index,
                len,
            })?;
        validate_control_point(index, &point)?;
        *slot = point;
        self.edited();
        Ok(())
    }

    /// Returns the knot at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexOutOfRange`] for an invalid index.
    pub fn knot(&self, index: usize) -> Result<f64> {
        self.knots.get(index).copied().ok_or_else(|| {
            GeometryError::IndexOutOfRange {
                what: "knot",
                index,
                len: self.knots.len(),
            }
            .into()
        })
    }

    /// Replaces the knot at `index`.
    ///
    /// The knot vector is left untouched if the new value would break
    /// monotonicity or empty the active domain.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid index or a value that would make the
    /// knot vector invalid.
    pub fn set_knot(&mut self, index: usize, value: f64) -> Result<()> {
        let old = self.knot(index)?;
        self.knots[index] = value;
        if let Err(e) = validate_knots(self.order, self.control_points.len(), &self.knots) {
            self.knots[index] = old;
            return Err(e.into());
        }
        self.edited();
        Ok(())
    }

    /// Replaces the attribute set.
    pub fn set_attributes(&mut self, attributes: Option<SharedAttributes>) {
        self.attributes = attributes;
        self.edited();
    }

    /// Returns the attribute set, if any.
    #[must_use]
    pub fn attributes(&self) -> Option<&SharedAttributes> {
        self.attributes.as_ref()
    }

    /// Returns whether the curve is a polyline through its span boundaries.
    ///
    /// An order-2 rational curve is straight between consecutive knots, so
    /// subdividing it adds no information.
    #[must_use]
    pub fn is_piecewise_linear(&self) -> bool {
        self.order == 2
    }

    /// Computes the distinct knots partitioning the active domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch buffer cannot be allocated.
    pub fn interesting_knots(&self) -> Result<InterestingKnots> {
        interesting_knots(&self.knots, self.control_points.len(), self.order)
    }

    /// Evaluates the curve at `u` in homogeneous coordinates.
    #[must_use]
    pub fn evaluate_homogeneous(&self, u: f64) -> RationalPoint4 {
        basis::evaluate_homogeneous(u, self.order, &self.knots, &self.control_points)
    }

    /// Evaluates the curve at `u` without checking the domain.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroWeight`] if the homogeneous weight
    /// vanishes at `u`, which can only happen outside the active domain.
    pub fn point_at(&self, u: f64) -> Result<Point3> {
        let h = self.evaluate_homogeneous(u);
        dehomogenize(&h).ok_or_else(|| GeometryError::ZeroWeight { parameter: u }.into())
    }

    fn edited(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Curve for NurbsCurve {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        let domain = self.domain();
        if t < domain.t_min - TOLERANCE || t > domain.t_max + TOLERANCE {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "u",
                value: t,
                min: domain.t_min,
                max: domain.t_max,
            }
            .into());
        }
        self.point_at(t.clamp(domain.t_min, domain.t_max))
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(self.knots[self.order - 1], self.knots[self.control_points.len()])
    }

    fn is_closed(&self) -> bool {
        let domain = self.domain();
        match (self.point_at(domain.t_min), self.point_at(domain.t_max)) {
            (Ok(start), Ok(end)) => (end - start).norm() < TOLERANCE,
            _ => false,
        }
    }
}

impl Geometry for NurbsCurve {
    fn kind(&self) -> GeometryKind {
        GeometryKind::NurbsCurve
    }

    fn duplicate(&self) -> Box<dyn Geometry> {
        Box::new(NurbsCurve::duplicate(self))
    }

    /// Bounds the Euclidean control points, which enclose the curve by the
    /// convex hull property.
    fn bounds(&self) -> Result<Aabb> {
        Aabb::from_points(self.control_points.iter().filter_map(dehomogenize)).ok_or_else(|| {
            GeometryError::InvalidGeometry("curve has no control points".into()).into()
        })
    }

    fn tessellate(&self, style: &SubdivisionStyle, view: Option<&ViewTransform>) -> Result<Polyline> {
        let policy = SubdivisionPolicy::from_style(style, view)?;
        TessellateCurve::new(self, policy).execute()
    }

    fn attributes(&self) -> Option<&SharedAttributes> {
        NurbsCurve::attributes(self)
    }

    fn set_attributes(&mut self, attributes: Option<SharedAttributes>) {
        NurbsCurve::set_attributes(self, attributes);
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn validate(
    order: usize,
    control_points: &[RationalPoint4],
    knots: &[f64],
) -> std::result::Result<(), GeometryError> {
    for (i, p) in control_points.iter().enumerate() {
        validate_control_point(i, p)?;
    }
    validate_knots(order, control_points.len(), knots)
}

fn validate_control_point(index: usize, p: &RationalPoint4) -> std::result::Result<(), GeometryError> {
    if !p.iter().all(|c| c.is_finite()) {
        return Err(GeometryError::InvalidGeometry(format!(
            "control point {index} is not finite"
        )));
    }
    if p.w <= TOLERANCE {
        return Err(GeometryError::InvalidGeometry(format!(
            "control point {index} has non-positive weight {}",
            p.w
        )));
    }
    Ok(())
}

fn validate_knots(order: usize, num_points: usize, knots: &[f64]) -> std::result::Result<(), GeometryError> {
    if order < 2 {
        return Err(GeometryError::InvalidGeometry(format!(
            "order must be at least 2, got {order}"
        )));
    }
    if num_points < order {
        return Err(GeometryError::InvalidGeometry(format!(
            "order {order} needs at least {order} control points, got {num_points}"
        )));
    }
    if knots.len() != num_points + order {
        return Err(GeometryError::InvalidGeometry(format!(
            "expected {} knots, got {}",
            num_points + order,
            knots.len()
        )));
    }
    if !knots.iter().all(|k| k.is_finite()) {
        return Err(GeometryError::InvalidGeometry("knot vector is not finite".into()));
    }
    if let Some(i) = knots.windows(2).position(|w| w[1] < w[0]) {
        return Err(GeometryError::InvalidGeometry(format!(
            "knot vector decreases at index {}",
            i + 1
        )));
    }
    if knots[order - 1] >= knots[num_points] {
        return Err(GeometryError::InvalidGeometry(
            "knot vector spans an empty domain".into(),
        ));
    }
    Ok(())
}
