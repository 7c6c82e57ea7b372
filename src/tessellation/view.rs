use crate::math::{Matrix4, Point2, Point3};

/// The world-to-window mapping of the view a curve is drawn in.
///
/// Matrices follow nalgebra's column-vector convention, so the combined
/// transform is `frustum_to_window * world_to_frustum`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    world_to_frustum: Matrix4,
    frustum_to_window: Matrix4,
}

impl ViewTransform {
    /// Creates a view transform from its two stages.
    #[must_use]
    pub fn new(world_to_frustum: Matrix4, frustum_to_window: Matrix4) -> Self {
        Self {
            world_to_frustum,
            frustum_to_window,
        }
    }

    /// A view in which window coordinates equal world coordinates.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Matrix4::identity(), Matrix4::identity())
    }

    /// Returns the world-to-frustum stage.
    #[must_use]
    pub fn world_to_frustum(&self) -> &Matrix4 {
        &self.world_to_frustum
    }

    /// Returns the frustum-to-window stage.
    #[must_use]
    pub fn frustum_to_window(&self) -> &Matrix4 {
        &self.frustum_to_window
    }

    /// Composes both stages into a single world-to-window matrix.
    #[must_use]
    pub fn world_to_window(&self) -> Matrix4 {
        self.frustum_to_window * self.world_to_frustum
    }

    /// Projects a world-space point to window coordinates.
    ///
    /// Composes the matrices on every call; use
    /// [`world_to_window`](Self::world_to_window) when projecting many points.
    #[must_use]
    pub fn project(&self, p: &Point3) -> Point2 {
        project_with(&self.world_to_window(), p)
    }
}

/// Projects `p` through a homogeneous matrix and drops the depth component.
#[must_use]
pub(crate) fn project_with(world_to_window: &Matrix4, p: &Point3) -> Point2 {
    let q = world_to_window.transform_point(p);
    Point2::new(q.x, q.y)
}
