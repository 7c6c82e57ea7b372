use super::Point3;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box containing a single point.
    #[must_use]
    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// Computes the smallest box enclosing all `points`.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |acc, p| acc.include(&p)))
    }

    /// Returns a copy of this box grown to contain `p`.
    #[must_use]
    pub fn include(&self, p: &Point3) -> Self {
        Self {
            min: self.min.inf(p),
            max: self.max.sup(p),
        }
    }

    /// Returns whether `p` lies inside or on the boundary of the box.
    #[must_use]
    pub fn contains(&self, p: &Point3, tolerance: f64) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tolerance && p[i] <= self.max[i] + tolerance)
    }
}
