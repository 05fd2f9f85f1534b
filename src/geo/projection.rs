//! Transverse Mercator projection on the WGS84 ellipsoid.
//!
//! The projection itself is geodesy's `tmerc` operator. This module centres
//! it on an arbitrary origin: the central meridian is the origin longitude
//! and the northing is offset so the origin itself maps to `(0, 0)`,
//! matching proj's `+proj=tmerc +lat_0=.. +lon_0=.. +k=1 +x_0=0 +y_0=0`.

use std::fmt;

use geodesy::prelude::*;

use super::{GeoPoint, LocalPoint};
use crate::error::XodrError;

/// A forward/inverse transverse Mercator mapping anchored at one origin.
pub struct TransverseMercator {
    origin: GeoPoint,
    context: Minimal,
    op: OpHandle,
    /// Northing of the origin latitude on the central meridian.
    northing_offset: f64,
}

impl TransverseMercator {
    /// Build a projection centred at `origin`.
    pub fn new(origin: GeoPoint) -> Result<Self, XodrError> {
        let mut context = Minimal::new();
        let definition = format!("tmerc lon_0={} ellps=WGS84", origin.lon);
        let op = context
            .op(&definition)
            .map_err(|err| projection_error(origin, err))?;

        let mut projection = Self {
            origin,
            context,
            op,
            northing_offset: 0.0,
        };
        projection.northing_offset = projection.project(origin)?.y;
        Ok(projection)
    }

    /// The origin this projection is centred on.
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Degrees to metres relative to the origin (x east, y north).
    pub fn project(&self, point: GeoPoint) -> Result<LocalPoint, XodrError> {
        // Keep the point on the origin's side of the antimeridian.
        let lon = self.origin.lon + wrap_longitude(point.lon - self.origin.lon);
        let mut data = [Coor2D([lon.to_radians(), point.lat.to_radians()])];
        self.apply(Fwd, &mut data)?;

        let [x, y] = data[0].0;
        Ok(LocalPoint::new(x, y - self.northing_offset))
    }

    /// Metres relative to the origin back to degrees.
    ///
    /// Longitudes are wrapped into `[-180, 180]`.
    pub fn unproject(&self, point: LocalPoint) -> Result<GeoPoint, XodrError> {
        let mut data = [Coor2D([point.x, point.y + self.northing_offset])];
        self.apply(Inv, &mut data)?;

        let [lon, lat] = data[0].0;
        Ok(GeoPoint::new(
            lat.to_degrees(),
            wrap_longitude(lon.to_degrees()),
        ))
    }

    fn apply(&self, direction: Direction, data: &mut [Coor2D; 1]) -> Result<(), XodrError> {
        let converted = self
            .context
            .apply(self.op, direction, data)
            .map_err(|err| projection_error(self.origin, err))?;

        let [a, b] = data[0].0;
        if converted != 1 || !a.is_finite() || !b.is_finite() {
            return Err(XodrError::Projection {
                origin: self.origin,
                message: "coordinate is outside the projection's domain".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for TransverseMercator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransverseMercator")
            .field("origin", &self.origin)
            .field("northing_offset", &self.northing_offset)
            .finish()
    }
}

/// Wrap a longitude into `[-180, 180]`, leaving values already in range
/// (including both ends) untouched.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

fn projection_error(origin: GeoPoint, err: geodesy::Error) -> XodrError {
    XodrError::Projection {
        origin,
        message: err.to_string(),
    }
}

/// The two projections of one run: the document's original origin and the
/// destination origin.
#[derive(Debug)]
pub struct ProjectionPair {
    pub source: TransverseMercator,
    pub target: TransverseMercator,
}

impl ProjectionPair {
    pub fn new(source_origin: GeoPoint, target_origin: GeoPoint) -> Result<Self, XodrError> {
        Ok(Self {
            source: TransverseMercator::new(source_origin)?,
            target: TransverseMercator::new(target_origin)?,
        })
    }

    /// True when both projections share an origin.
    pub fn is_same_origin(&self) -> bool {
        self.source.origin() == self.target.origin()
    }
}
