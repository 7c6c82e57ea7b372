use tracing::trace;

use crate::error::{Result, TessellationError};

use super::TessellationConfig;

/// A growable output buffer shared by all subdivision strategies.
///
/// Capacity is held as default-initialised slots so consumers that read
/// auxiliary fields of unused slots see zeroed values. Growth happens in
/// fixed increments and every allocation is fallible.
#[derive(Debug)]
pub struct VertexBuffer<T> {
    slots: Vec<T>,
    len: usize,
    growth_increment: usize,
    max_len: usize,
}

impl<T: Default> VertexBuffer<T> {
    /// Allocates a buffer with exactly `capacity` default slots.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::VertexLimitExceeded`] if `capacity`
    /// exceeds the configured maximum, or
    /// [`TessellationError::AllocationFailed`] if allocation fails.
    pub fn with_capacity(capacity: usize, config: &TessellationConfig) -> Result<Self> {
        if capacity > config.max_vertices {
            return Err(TessellationError::VertexLimitExceeded {
                limit: config.max_vertices,
            }
            .into());
        }
        let mut buffer = Self {
            slots: Vec::new(),
            len: 0,
            growth_increment: config.growth_increment.max(1),
            max_len: config.max_vertices,
        };
        buffer.reserve_slots(capacity)?;
        Ok(buffer)
    }

    /// Allocates a buffer sized from a projected vertex count.
    ///
    /// The projection is `span_count + 1 + domain_length / threshold` plus
    /// one growth increment, clamped to `[2, capacity_ceiling]`.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::AllocationFailed`] if allocation fails.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn with_estimate(
        span_count: usize,
        domain_length: f64,
        threshold: f64,
        config: &TessellationConfig,
    ) -> Result<Self> {
        let ceiling = config.capacity_ceiling.min(config.max_vertices).max(2);
        let projected =
            span_count as f64 + 1.0 + domain_length / threshold + config.growth_increment as f64;
        let capacity = if projected.is_finite() && projected < ceiling as f64 {
            (projected as usize).max(2)
        } else {
            ceiling
        };
        Self::with_capacity(capacity, config)
    }

    /// Appends a value, growing the buffer if it is full.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::VertexLimitExceeded`] once the buffer
    /// holds the configured maximum, or
    /// [`TessellationError::AllocationFailed`] if growth fails.
    pub fn push(&mut self, value: T) -> Result<()> {
        if self.len == self.max_len {
            return Err(TessellationError::VertexLimitExceeded {
                limit: self.max_len,
            }
            .into());
        }
        if self.len == self.slots.len() {
            let additional = self.growth_increment.min(self.max_len - self.len);
            trace!(
                from = self.slots.len(),
                to = self.slots.len() + additional,
                "growing vertex buffer"
            );
            self.reserve_slots(additional)?;
        }
        self.slots[self.len] = value;
        self.len += 1;
        Ok(())
    }

    fn reserve_slots(&mut self, additional: usize) -> Result<()> {
        self.slots
            .try_reserve_exact(additional)
            .map_err(|_| TessellationError::AllocationFailed {
                requested: self.slots.len() + additional,
            })?;
        let target = self.slots.len() + additional;
        self.slots.resize_with(target, T::default);
        Ok(())
    }
}

impl<T> VertexBuffer<T> {
    /// Returns the number of filled slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether no slot is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of allocated slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the filled slots.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.slots[..self.len]
    }

    /// Returns all allocated slots, including unfilled ones.
    #[must_use]
    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    /// Consumes the buffer, returning exactly the filled slots.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<T> {
        self.slots.truncate(self.len);
        self.slots
    }
}
