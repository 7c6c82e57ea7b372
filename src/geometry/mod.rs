pub mod curve;

pub use curve::{Curve, CurveDomain, NurbsCurve, NurbsCurveData};

use std::any::Any;
use std::fmt::Debug;

use crate::attribute::SharedAttributes;
use crate::error::Result;
use crate::math::Aabb;
use crate::tessellation::{Polyline, SubdivisionStyle, ViewTransform};

/// The concrete kind of a [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// A non-uniform rational B-spline curve.
    NurbsCurve,
}

impl GeometryKind {
    /// Returns a human-readable name for the kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::NurbsCurve => "NURB curve",
        }
    }
}

/// Behaviour shared by every geometry hosted in a
/// [`GeometryStore`](crate::store::GeometryStore).
///
/// Construction is provided by each concrete type (for example
/// [`NurbsCurve::from_data`]) and disposal is [`Drop`].
pub trait Geometry: Debug + Send + Sync {
    /// Returns the concrete kind.
    fn kind(&self) -> GeometryKind;

    /// Returns a deep copy, duplicating rather than sharing the attribute set.
    fn duplicate(&self) -> Box<dyn Geometry>;

    /// Computes an axis-aligned box enclosing the geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry has no extent.
    fn bounds(&self) -> Result<Aabb>;

    /// Tessellates the geometry under the given subdivision style.
    ///
    /// `view` is required for screen-space subdivision.
    ///
    /// # Errors
    ///
    /// Returns an error if the style is invalid or tessellation fails.
    fn tessellate(&self, style: &SubdivisionStyle, view: Option<&ViewTransform>) -> Result<Polyline>;

    /// Returns the attribute set, if any.
    fn attributes(&self) -> Option<&SharedAttributes>;

    /// Replaces the attribute set and marks the geometry edited.
    fn set_attributes(&mut self, attributes: Option<SharedAttributes>);

    /// Returns a counter that changes whenever the geometry is edited.
    fn generation(&self) -> u64;

    /// Upcasts for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts for typed mutable access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
