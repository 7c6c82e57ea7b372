mod adaptive;
mod constant;
mod tessellate_curve;
mod vertex_buffer;
mod view;

pub use tessellate_curve::TessellateCurve;
pub use vertex_buffer::VertexBuffer;
pub use view::ViewTransform;

use crate::attribute::SharedAttributes;
use crate::error::{Result, TessellationError};
use crate::math::Point3;

/// The subdivision method selected by the host view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubdivisionMethod {
    /// A fixed number of segments per knot span.
    Constant,
    /// Segments no longer than a world-space distance.
    WorldSpace,
    /// Segments no longer than a window-space distance in pixels.
    ScreenSpace,
}

/// Host-side subdivision state: a method plus its numeric parameters.
///
/// Curves only use `c1`; `c2` is the second parameter surfaces use and is
/// carried so the style can be passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubdivisionStyle {
    pub method: SubdivisionMethod,
    pub c1: f64,
    pub c2: f64,
}

impl SubdivisionStyle {
    /// Creates a new style.
    #[must_use]
    pub fn new(method: SubdivisionMethod, c1: f64, c2: f64) -> Self {
        Self { method, c1, c2 }
    }

    /// Constant subdivision with `segments` per span.
    #[must_use]
    pub fn constant(segments: f64) -> Self {
        Self::new(SubdivisionMethod::Constant, segments, segments)
    }

    /// World-space subdivision with a maximum chord length.
    #[must_use]
    pub fn world_space(max_chord: f64) -> Self {
        Self::new(SubdivisionMethod::WorldSpace, max_chord, max_chord)
    }

    /// Screen-space subdivision with a maximum chord length in pixels.
    #[must_use]
    pub fn screen_space(max_pixels: f64) -> Self {
        Self::new(SubdivisionMethod::ScreenSpace, max_pixels, max_pixels)
    }
}

impl Default for SubdivisionStyle {
    fn default() -> Self {
        Self::constant(10.0)
    }
}

/// The subdivision policy applied to one tessellation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubdivisionPolicy {
    /// Split every span into `floor(segments_per_span)` equal parameter steps.
    Constant { segments_per_span: f64 },
    /// Bisect until consecutive points are at most `max_chord` apart.
    WorldSpace { max_chord: f64 },
    /// Bisect until consecutive projected points are at most `max_pixels`
    /// apart in window coordinates.
    ScreenSpace { max_pixels: f64, view: ViewTransform },
}

impl SubdivisionPolicy {
    /// Builds the policy for a host subdivision style.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::MissingViewTransform`] for a screen-space
    /// style without a view.
    pub fn from_style(style: &SubdivisionStyle, view: Option<&ViewTransform>) -> Result<Self> {
        Ok(match style.method {
            SubdivisionMethod::Constant => Self::Constant {
                segments_per_span: style.c1,
            },
            SubdivisionMethod::WorldSpace => Self::WorldSpace { max_chord: style.c1 },
            SubdivisionMethod::ScreenSpace => Self::ScreenSpace {
                max_pixels: style.c1,
                view: *view.ok_or(TessellationError::MissingViewTransform)?,
            },
        })
    }

    /// Returns the method this policy implements.
    #[must_use]
    pub fn method(&self) -> SubdivisionMethod {
        match self {
            Self::Constant { .. } => SubdivisionMethod::Constant,
            Self::WorldSpace { .. } => SubdivisionMethod::WorldSpace,
            Self::ScreenSpace { .. } => SubdivisionMethod::ScreenSpace,
        }
    }
}

/// Limits and clamps applied during tessellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationConfig {
    /// Upper bound on the pre-allocated vertex capacity.
    pub capacity_ceiling: usize,
    /// Number of slots added each time the vertex buffer fills up.
    pub growth_increment: usize,
    /// Hard limit on the number of emitted vertices.
    pub max_vertices: usize,
    /// Smallest accepted world-space chord length.
    pub min_world_threshold: f64,
    /// Smallest accepted screen-space chord length, in pixels.
    pub min_screen_threshold: f64,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            capacity_ceiling: 1000,
            growth_increment: 5,
            max_vertices: 1 << 20,
            min_world_threshold: 0.001,
            min_screen_threshold: 1.0,
        }
    }
}

impl TessellationConfig {
    #[must_use]
    pub fn with_capacity_ceiling(mut self, capacity_ceiling: usize) -> Self {
        self.capacity_ceiling = capacity_ceiling;
        self
    }

    #[must_use]
    pub fn with_growth_increment(mut self, growth_increment: usize) -> Self {
        self.growth_increment = growth_increment;
        self
    }

    #[must_use]
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }

    #[must_use]
    pub fn with_min_world_threshold(mut self, min_world_threshold: f64) -> Self {
        self.min_world_threshold = min_world_threshold;
        self
    }

    #[must_use]
    pub fn with_min_screen_threshold(mut self, min_screen_threshold: f64) -> Self {
        self.min_screen_threshold = min_screen_threshold;
        self
    }
}

/// A polyline vertex.
#[derive(Debug)]
pub struct Vertex {
    /// Position of the vertex.
    pub point: Point3,
    /// Per-vertex attributes. Tessellation never sets these.
    pub attributes: Option<SharedAttributes>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

impl Vertex {
    /// Creates a vertex without attributes.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            attributes: None,
        }
    }
}

/// A polyline approximation of a curve.
#[derive(Debug, Default)]
pub struct Polyline {
    /// The ordered vertices of the polyline.
    pub vertices: Vec<Vertex>,
    /// Attribute set shared with the tessellated curve.
    pub attributes: Option<SharedAttributes>,
}

impl Polyline {
    /// Returns the number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns whether the polyline has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates over the vertex positions.
    pub fn points(&self) -> impl Iterator<Item = &Point3> {
        self.vertices.iter().map(|v| &v.point)
    }

    /// Returns the total length of all segments.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.vertices
            .windows(2)
            .map(|w| (w[1].point - w[0].point).norm())
            .sum()
    }
}
