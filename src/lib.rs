//! Rational B-spline curves and their tessellation into polylines.

pub mod attribute;
pub mod error;
pub mod geometry;
pub mod math;
pub mod store;
pub mod tessellation;

pub use error::{NurblineError, Result};
