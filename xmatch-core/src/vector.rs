//! Unit vectors on the celestial sphere.
//!
//! Catalog positions arrive as spherical coordinates (longitude/latitude in
//! degrees), but proximity math is cleanest on 3D unit vectors: there is no
//! discontinuity at the 0/360 wrap and no distortion at the poles. The
//! typical workflow is:
//!
//! 1. Convert each row's (lon, lat) to a [`UnitVec3`] with
//!    [`from_sky`](UnitVec3::from_sky)
//! 2. Compute separations with [`separation`](UnitVec3::separation)
//! 3. Recover spherical coordinates with [`to_sky`](UnitVec3::to_sky) when
//!    a grid cell assignment needs them
//!
//! # Separation formula
//!
//! [`separation`](UnitVec3::separation) uses the arctangent form
//! `atan2(|a × b|, a · b)`, which is accurate at all separations — the
//! bare `acos(a · b)` form loses precision for the very small angles that
//! matching tolerances live at (arcseconds), and the flat Euclidean
//! approximation breaks down near the poles.

use crate::angle::Angle;
use crate::constants::DEG_TO_RAD;

/// A unit vector on the celestial sphere.
///
/// Components are public for direct access; constructors keep the vector
/// normalized, so `x² + y² + z² = 1` holds for any value built through
/// [`from_sky`](Self::from_sky).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitVec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl UnitVec3 {
    /// Builds a unit vector from sky coordinates in degrees.
    ///
    /// `lon_deg` is the azimuthal angle (right ascension, galactic
    /// longitude, ...), `lat_deg` the elevation from the equatorial plane
    /// (declination, galactic latitude, ...).
    pub fn from_sky(lon_deg: f64, lat_deg: f64) -> Self {
        let (sin_lon, cos_lon) = libm::sincos(lon_deg * DEG_TO_RAD);
        let (sin_lat, cos_lat) = libm::sincos(lat_deg * DEG_TO_RAD);
        UnitVec3 {
            x: cos_lat * cos_lon,
            y: cos_lat * sin_lon,
            z: sin_lat,
        }
    }

    /// Recovers sky coordinates in degrees: (longitude in [0, 360), latitude).
    pub fn to_sky(&self) -> (f64, f64) {
        let lon = libm::atan2(self.y, self.x) * crate::constants::RAD_TO_DEG;
        let lat = libm::atan2(self.z, libm::hypot(self.x, self.y)) * crate::constants::RAD_TO_DEG;
        (crate::angle::wrap_longitude_deg(lon), lat)
    }

    /// Dot product.
    #[inline]
    pub fn dot(&self, other: &UnitVec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Magnitude of the cross product.
    #[inline]
    pub fn cross_norm(&self, other: &UnitVec3) -> f64 {
        let cx = self.y * other.z - self.z * other.y;
        let cy = self.z * other.x - self.x * other.z;
        let cz = self.x * other.y - self.y * other.x;
        libm::sqrt(cx * cx + cy * cy + cz * cz)
    }

    /// Great-circle separation to another unit vector.
    ///
    /// Uses `atan2(|a × b|, a · b)`, accurate from sub-arcsecond
    /// separations up to antipodal points.
    pub fn separation(&self, other: &UnitVec3) -> Angle {
        Angle::from_radians(libm::atan2(self.cross_norm(other), self.dot(other)))
    }
}
