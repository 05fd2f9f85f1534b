//! Geodetic building blocks for re-georeferencing a road network.
//!
//! A map document mixes two kinds of geometry: absolute positions in
//! WGS84 degrees and planar offsets in metres relative to the document's
//! local frame. This module provides the pieces needed to move both kinds
//! consistently onto a new origin:
//!
//! - [`GeoReference`]: structured view of the proj4 origin descriptor.
//! - [`TransverseMercator`] / [`ProjectionPair`]: conformal projection
//!   between degrees and metres around an arbitrary origin, built on
//!   geodesy's `tmerc` operator.
//! - [`Rotation`]: planar rotation of points and headings.
//!
//! # Design Principles
//!
//! 1. **Distinct types per frame**: [`GeoPoint`], [`LocalPoint`] and
//!    [`Heading`] cannot be mixed up at compile time.
//!
//! 2. **Read-only after construction**: projections and rotations hold no
//!    mutable state and can be shared freely within a run.
//!
//! # Example
//!
//! ```
//! use xodr_transform::geo::{GeoPoint, LocalPoint, Rotation, TransverseMercator};
//!
//! let tm = TransverseMercator::new(GeoPoint::new(39.0, -77.0))?;
//! let local = tm.project(GeoPoint::new(39.001, -77.001))?;
//! let back = tm.unproject(local)?;
//! assert!((back.lat - 39.001).abs() < 1e-9);
//!
//! let quarter = Rotation::from_degrees(90.0);
//! let p = quarter.rotate_point(LocalPoint::new(10.0, 0.0));
//! assert!(p.x.abs() < 1e-9 && (p.y - 10.0).abs() < 1e-9);
//! # Ok::<(), xodr_transform::XodrError>(())
//! ```

pub mod georef;
mod point;
pub mod projection;
pub mod rotation;

// Re-export core types for convenient access
pub use georef::{parse_origin, rewrite_origin, GeoReference, ProjParam};
pub use point::{GeoPoint, Heading, LocalPoint};
pub use projection::{wrap_longitude, ProjectionPair, TransverseMercator};
pub use rotation::{normalize_heading, rotate_heading, rotate_point, Rotation};
