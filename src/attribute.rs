//! Attribute sets attached to geometry and carried through to tessellated
//! output.
//!
//! A [`SharedAttributes`] handle is either shared with another owner
//! ([`SharedAttributes::share`]) or deep-copied into an independent set
//! ([`SharedAttributes::duplicate`]). The choice is always made explicitly by
//! the caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::math::Vector3;

/// The kind of an attribute stored in an [`AttributeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    DiffuseColor,
    SpecularColor,
    SpecularControl,
    Transparency,
    HighlightState,
    Normal,
}

/// The value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue {
    /// An RGB color with components in `[0, 1]`.
    Color(Vector3),
    /// A scalar quantity.
    Scalar(f64),
    /// A direction or position.
    Vector(Vector3),
    /// An on/off switch.
    Switch(bool),
}

/// A collection of attributes keyed by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    entries: BTreeMap<AttributeKind, AttributeValue>,
}

impl AttributeSet {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `kind`, if present.
    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> Option<&AttributeValue> {
        self.entries.get(&kind)
    }

    /// Sets `kind` to `value`, returning the previous value.
    pub fn insert(&mut self, kind: AttributeKind, value: AttributeValue) -> Option<AttributeValue> {
        self.entries.insert(kind, value)
    }

    /// Removes `kind` from the set.
    pub fn remove(&mut self, kind: AttributeKind) -> Option<AttributeValue> {
        self.entries.remove(&kind)
    }

    /// Returns whether `kind` is present.
    #[must_use]
    pub fn contains(&self, kind: AttributeKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Returns the number of attributes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the set holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the attributes in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeKind, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}

/// Reference-counted handle to an [`AttributeSet`].
///
/// Not `Clone`: callers pick [`share`](Self::share) or
/// [`duplicate`](Self::duplicate) explicitly.
#[derive(Debug)]
pub struct SharedAttributes(Arc<AttributeSet>);

impl SharedAttributes {
    /// Wraps a new attribute set.
    #[must_use]
    pub fn new(set: AttributeSet) -> Self {
        Self(Arc::new(set))
    }

    /// Returns a new handle to the same underlying set.
    #[must_use]
    pub fn share(&self) -> Self {
        Self(Arc::clone(&self.0))
    }

    /// Returns a handle to an independent deep copy of the set.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self(Arc::new(AttributeSet::clone(&self.0)))
    }

    /// Returns whether both handles refer to the same set.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the number of handles sharing this set.
    #[must_use]
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Returns the underlying set.
    #[must_use]
    pub fn get(&self) -> &AttributeSet {
        &self.0
    }

    /// Returns mutable access, copying the set first if it is shared.
    pub fn make_mut(&mut self) -> &mut AttributeSet {
        Arc::make_mut(&mut self.0)
    }
}

/// Shares an optional handle.
pub(crate) fn share_opt(attributes: Option<&SharedAttributes>) -> Option<SharedAttributes> {
    attributes.map(SharedAttributes::share)
}

/// Duplicates an optional handle.
pub(crate) fn duplicate_opt(attributes: Option<&SharedAttributes>) -> Option<SharedAttributes> {
    attributes.map(SharedAttributes::duplicate)
}
