pub mod aabb;

pub use aabb::Aabb;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Rational control point in homogeneous form `(x, y, z, w)`.
///
/// The `x`, `y` and `z` components are already multiplied by the weight `w`,
/// so the Euclidean position is `(x / w, y / w, z / w)`.
pub type RationalPoint4 = nalgebra::Vector4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Divides a homogeneous point by its weight.
///
/// Returns `None` when the weight is too close to zero for the division
/// to produce a finite point.
#[must_use]
pub fn dehomogenize(p: &RationalPoint4) -> Option<Point3> {
    if p.w.abs() < TOLERANCE {
        return None;
    }
    let oow = 1.0 / p.w;
    Some(Point3::new(p.x * oow, p.y * oow, p.z * oow))
}
