use slotmap::SlotMap;
use tracing::trace;

use crate::attribute::SharedAttributes;
use crate::error::{Result, StoreError};
use crate::geometry::Geometry;
use crate::tessellation::{Polyline, SubdivisionStyle, ViewTransform};

slotmap::new_key_type! {
    /// Unique identifier for a geometry in the store.
    pub struct GeometryId;
}

/// A tessellation together with the state it was built from.
#[derive(Debug)]
struct CachedPolyline {
    generation: u64,
    style: SubdivisionStyle,
    view: Option<ViewTransform>,
    polyline: Polyline,
}

impl CachedPolyline {
    fn is_fresh(&self, generation: u64, style: &SubdivisionStyle, view: Option<&ViewTransform>) -> bool {
        self.generation == generation && self.style == *style && self.view.as_ref() == view
    }
}

#[derive(Debug)]
struct Entry {
    geometry: Box<dyn Geometry>,
    cache: Option<CachedPolyline>,
}

/// Central arena that owns geometry objects and their cached tessellations.
///
/// Geometries are referenced by typed IDs (generational indices). Editing a
/// geometry through [`edit`](Self::edit) drops its cached polyline; the
/// cache is also rebuilt whenever the geometry's generation, the
/// subdivision style or the view changes.
#[derive(Debug, Default)]
pub struct GeometryStore {
    entries: SlotMap<GeometryId, Entry>,
}

impl GeometryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a geometry and returns its ID.
    pub fn insert<G: Geometry + 'static>(&mut self, geometry: G) -> GeometryId {
        self.insert_boxed(Box::new(geometry))
    }

    /// Inserts an already boxed geometry and returns its ID.
    pub fn insert_boxed(&mut self, geometry: Box<dyn Geometry>) -> GeometryId {
        self.entries.insert(Entry {
            geometry,
            cache: None,
        })
    }

    /// Returns the number of geometries in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether `id` refers to a live geometry.
    #[must_use]
    pub fn contains(&self, id: GeometryId) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns a reference to the geometry, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn get(&self, id: GeometryId) -> std::result::Result<&dyn Geometry, StoreError> {
        self.entry(id).map(|e| e.geometry.as_ref())
    }

    /// Returns the geometry as its concrete type.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found or is not a `G`.
    pub fn get_as<G: Geometry + 'static>(&self, id: GeometryId) -> std::result::Result<&G, StoreError> {
        self.entry(id)?
            .geometry
            .as_any()
            .downcast_ref::<G>()
            .ok_or(StoreError::TypeMismatch {
                expected: std::any::type_name::<G>(),
            })
    }

    /// Mutates the geometry as its concrete type and invalidates its cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found, is not a `G`, or `f`
    /// fails.
    pub fn edit<G, R, F>(&mut self, id: GeometryId, f: F) -> Result<R>
    where
        G: Geometry + 'static,
        F: FnOnce(&mut G) -> Result<R>,
    {
        let entry = self.entry_mut(id)?;
        let geometry = entry
            .geometry
            .as_any_mut()
            .downcast_mut::<G>()
            .ok_or(StoreError::TypeMismatch {
                expected: std::any::type_name::<G>(),
            })?;
        let result = f(geometry);
        entry.cache = None;
        result
    }

    /// Replaces the attribute set of a geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn set_attributes(
        &mut self,
        id: GeometryId,
        attributes: Option<SharedAttributes>,
    ) -> std::result::Result<(), StoreError> {
        let entry = self.entry_mut(id)?;
        entry.geometry.set_attributes(attributes);
        entry.cache = None;
        Ok(())
    }

    /// Inserts a deep copy of a geometry and returns the new ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn duplicate(&mut self, id: GeometryId) -> std::result::Result<GeometryId, StoreError> {
        let copy = self.entry(id)?.geometry.duplicate();
        Ok(self.insert_boxed(copy))
    }

    /// Removes a geometry and its cached tessellation from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn dispose(&mut self, id: GeometryId) -> std::result::Result<Box<dyn Geometry>, StoreError> {
        self.entries
            .remove(id)
            .map(|e| e.geometry)
            .ok_or_else(|| StoreError::EntityNotFound("geometry".into()))
    }

    /// Returns the tessellation of a geometry, rebuilding the cached polyline
    /// if it is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found or tessellation fails. A
    /// failed rebuild leaves no cached polyline behind.
    pub fn polyline(
        &mut self,
        id: GeometryId,
        style: &SubdivisionStyle,
        view: Option<&ViewTransform>,
    ) -> Result<&Polyline> {
        let entry = self.entry_mut(id)?;
        let generation = entry.geometry.generation();
        // Taken out so a failed rebuild leaves the slot empty.
        let fresh = entry
            .cache
            .take()
            .filter(|c| c.is_fresh(generation, style, view));
        let cached = if let Some(cached) = fresh {
            trace!(?id, "tessellation cache hit");
            cached
        } else {
            trace!(?id, "rebuilding tessellation cache");
            CachedPolyline {
                generation,
                style: *style,
                view: view.copied(),
                polyline: entry.geometry.tessellate(style, view)?,
            }
        };
        Ok(&entry.cache.insert(cached).polyline)
    }

    /// Returns whether a fresh tessellation is cached for the given state.
    #[must_use]
    pub fn is_cached(&self, id: GeometryId, style: &SubdivisionStyle, view: Option<&ViewTransform>) -> bool {
        self.entries.get(id).is_some_and(|e| {
            e.cache
                .as_ref()
                .is_some_and(|c| c.is_fresh(e.geometry.generation(), style, view))
        })
    }

    fn entry(&self, id: GeometryId) -> std::result::Result<&Entry, StoreError> {
        self.entries
            .get(id)
            .ok_or_else(|| StoreError::EntityNotFound("geometry".into()))
    }

    fn entry_mut(&mut self, id: GeometryId) -> std::result::Result<&mut Entry, StoreError> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| StoreError::EntityNotFound("geometry".into()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeKind, AttributeSet, AttributeValue};
    use crate::error::NurblineError;
    use crate::geometry::{GeometryKind, NurbsCurve};
    use crate::math::RationalPoint4;

    fn arch() -> NurbsCurve {
        NurbsCurve::new(
            3,
            vec![
                RationalPoint4::new(0.0, 0.0, 0.0, 1.0),
                RationalPoint4::new(1.0, 2.0, 0.0, 1.0),
                RationalPoint4::new(2.0, 0.0, 0.0, 1.0),
            ],
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
        .unwrap()
    }

    fn marked() -> SharedAttributes {
        let mut set = AttributeSet::new();
        set.insert(AttributeKind::HighlightState, AttributeValue::Switch(true));
        SharedAttributes::new(set)
    }

    #[test]
    fn insert_get_and_dispose() {
        let mut store = GeometryStore::new();
        let id = store.insert(arch());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id).unwrap().kind(), GeometryKind::NurbsCurve);
        assert_eq!(store.get_as::<NurbsCurve>(id).unwrap().order(), 3);

        let removed = store.dispose(id).unwrap();
        assert_eq!(removed.kind(), GeometryKind::NurbsCurve);
        assert_eq!(removed.kind().name(), "NURB curve");
        assert!(store.is_empty());
        assert!(!store.contains(id));
        assert!(matches!(store.get(id), Err(StoreError::EntityNotFound(_))));
        assert!(store.dispose(id).is_err());
    }

    #[test]
    fn polyline_is_cached_until_edited() {
        let mut store = GeometryStore::new();
        let id = store.insert(arch());
        let style = SubdivisionStyle::constant(4.0);

        assert_eq!(store.polyline(id, &style, None).unwrap().len(), 5);
        assert!(store.is_cached(id, &style, None));

        store
            .edit(id, |c: &mut NurbsCurve| {
                c.set_control_point(1, RationalPoint4::new(1.0, 4.0, 0.0, 1.0))
            })
            .unwrap();
        assert!(!store.is_cached(id, &style, None));
        assert_eq!(store.get(id).unwrap().generation(), 1);

        let apex = store.polyline(id, &style, None).unwrap().vertices[2].point;
        assert!((apex.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn style_change_rebuilds_cache() {
        let mut store = GeometryStore::new();
        let id = store.insert(arch());
        let coarse = SubdivisionStyle::constant(2.0);
        let fine = SubdivisionStyle::constant(8.0);

        assert_eq!(store.polyline(id, &coarse, None).unwrap().len(), 3);
        assert!(!store.is_cached(id, &fine, None));
        assert_eq!(store.polyline(id, &fine, None).unwrap().len(), 9);
        assert!(!store.is_cached(id, &coarse, None));
    }

    #[test]
    fn failed_rebuild_leaves_no_cache() {
        let mut store = GeometryStore::new();
        let id = store.insert(arch());
        let style = SubdivisionStyle::screen_space(2.0);
        let err = store.polyline(id, &style, None).unwrap_err();
        assert!(matches!(err, NurblineError::Tessellation(_)));
        assert!(!store.is_cached(id, &style, None));
    }

    #[test]
    fn failed_rebuild_drops_stale_polyline() {
        let mut store = GeometryStore::new();
        let id = store.insert(arch());
        let constant = SubdivisionStyle::constant(4.0);
        store.polyline(id, &constant, None).unwrap();
        assert!(store.is_cached(id, &constant, None));

        assert!(store
            .polyline(id, &SubdivisionStyle::screen_space(2.0), None)
            .is_err());
        assert!(!store.is_cached(id, &constant, None));

        // The next request rebuilds from scratch.
        assert_eq!(store.polyline(id, &constant, None).unwrap().len(), 5);
        assert!(store.is_cached(id, &constant, None));
    }

    #[test]
    fn cache_hit_keeps_polyline() {
        let mut store = GeometryStore::new();
        let id = store.insert(arch());
        let style = SubdivisionStyle::world_space(0.1);
        let first: Vec<_> = store.polyline(id, &style, None).unwrap().points().copied().collect();
        assert!(store.is_cached(id, &style, None));
        let second: Vec<_> = store.polyline(id, &style, None).unwrap().points().copied().collect();
        assert_eq!(first, second);
        assert!(store.is_cached(id, &style, None));
    }

    #[test]
    fn edit_with_wrong_type_is_rejected() {
        #[derive(Debug)]
        struct Marker;

        impl Geometry for Marker {
            fn kind(&self) -> GeometryKind {
                GeometryKind::NurbsCurve
            }
            fn duplicate(&self) -> Box<dyn Geometry> {
                Box::new(Marker)
            }
            fn bounds(&self) -> Result<crate::math::Aabb> {
                Ok(crate::math::Aabb::from_point(crate::math::Point3::origin()))
            }
            fn tessellate(&self, _: &SubdivisionStyle, _: Option<&ViewTransform>) -> Result<Polyline> {
                Ok(Polyline::default())
            }
            fn attributes(&self) -> Option<&SharedAttributes> {
                None
            }
            fn set_attributes(&mut self, _: Option<SharedAttributes>) {}
            fn generation(&self) -> u64 {
                0
            }
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
                self
            }
        }

        let mut store = GeometryStore::new();
        let id = store.insert(Marker);
        let err = store.edit(id, |_: &mut NurbsCurve| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            NurblineError::Store(StoreError::TypeMismatch { .. })
        ));
        assert!(store.get_as::<NurbsCurve>(id).is_err());
    }

    #[test]
    fn duplicate_copies_and_attributes_follow_into_polyline() {
        let mut store = GeometryStore::new();
        let attrs = marked();
        let id = store.insert(arch());
        store.set_attributes(id, Some(attrs.share())).unwrap();

        let copy = store.duplicate(id).unwrap();
        assert_ne!(id, copy);
        let copied = store.get(copy).unwrap().attributes().unwrap();
        assert!(!copied.ptr_eq(&attrs));
        assert_eq!(copied.get(), attrs.get());

        let style = SubdivisionStyle::default();
        let polyline = store.polyline(id, &style, None).unwrap();
        assert!(polyline.attributes.as_ref().unwrap().ptr_eq(&attrs));
        assert_eq!(polyline.len(), 11);
    }

    #[test]
    fn bounds_through_trait_object() {
        let mut store = GeometryStore::new();
        let id = store.insert(arch());
        let bb = store.get(id).unwrap().bounds().unwrap();
        assert!((bb.max.y - 2.0).abs() < 1e-12);
        assert!((bb.max.x - 2.0).abs() < 1e-12);
    }
}
