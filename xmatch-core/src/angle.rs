//! Angles and sky-coordinate domain validation.
//!
//! [`Angle`] is a thin newtype over radians with constructors and accessors
//! for the units that show up in catalog work (degrees for coordinate
//! columns, arcseconds for matching tolerances). Keeping a single internal
//! unit avoids unit bugs at the seams between extraction, indexing and
//! matching.
//!
//! The validation functions implement the coordinate domain rules for
//! tabular catalogs: longitudes wrap into [0°, 360°), latitudes must lie in
//! [-90°, +90°], and non-finite values are rejected. They return a
//! [`DomainViolation`] describing the reason; the caller attaches row and
//! column context.

use crate::constants::{ARCSEC_PER_DEG, DEG_TO_RAD, RAD_TO_DEG};
use thiserror::Error;

/// An angle, stored internally in radians.
///
/// ```
/// use xmatch_core::Angle;
///
/// let tol = Angle::from_arcseconds(5.0);
/// assert!((tol.degrees() - 5.0 / 3600.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle(f64);

impl Angle {
    /// Creates an angle from radians.
    #[inline]
    pub fn from_radians(rad: f64) -> Self {
        Angle(rad)
    }

    /// Creates an angle from degrees.
    #[inline]
    pub fn from_degrees(deg: f64) -> Self {
        Angle(deg * DEG_TO_RAD)
    }

    /// Creates an angle from arcseconds.
    #[inline]
    pub fn from_arcseconds(arcsec: f64) -> Self {
        Self::from_degrees(arcsec / ARCSEC_PER_DEG)
    }

    /// The angle in radians.
    #[inline]
    pub fn radians(&self) -> f64 {
        self.0
    }

    /// The angle in degrees.
    #[inline]
    pub fn degrees(&self) -> f64 {
        self.0 * RAD_TO_DEG
    }

    /// The angle in arcseconds.
    #[inline]
    pub fn arcseconds(&self) -> f64 {
        self.degrees() * ARCSEC_PER_DEG
    }

    /// Sine and cosine of the angle, computed together.
    #[inline]
    pub fn sin_cos(&self) -> (f64, f64) {
        libm::sincos(self.0)
    }

    /// Returns `true` if the underlying value is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }
}

/// Why a coordinate value failed domain validation.
///
/// Carries no row/column context; the extraction layer adds that when it
/// turns a violation into a reportable error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainViolation {
    #[error("value is not finite")]
    NotFinite,
    #[error("latitude out of [-90, +90] degrees")]
    LatitudeOutOfRange,
}

/// Wraps a longitude in degrees into [0, 360).
#[inline]
pub fn wrap_longitude_deg(deg: f64) -> f64 {
    let wrapped = libm::fmod(deg, 360.0);
    if wrapped < 0.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Validates a sky longitude in degrees.
///
/// Any finite value is accepted and wrapped into [0°, 360°); the 0/360
/// boundary is a representation artifact, not a domain limit.
pub fn validate_longitude_deg(deg: f64) -> Result<f64, DomainViolation> {
    if !deg.is_finite() {
        return Err(DomainViolation::NotFinite);
    }
    Ok(wrap_longitude_deg(deg))
}

/// Validates a sky latitude in degrees.
///
/// Must be finite and within [-90°, +90°]; unlike longitude there is no
/// meaningful wrap for latitude in catalog data.
pub fn validate_latitude_deg(deg: f64) -> Result<f64, DomainViolation> {
    if !deg.is_finite() {
        return Err(DomainViolation::NotFinite);
    }
    if !(-90.0..=90.0).contains(&deg) {
        return Err(DomainViolation::LatitudeOutOfRange);
    }
    Ok(deg)
}
