//! Shared foundations for catalog cross-matching.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`angle`] | [`Angle`] newtype, longitude/latitude domain validation |
//! | [`vector`] | [`UnitVec3`] sky positions, great-circle separation |
//! | [`errors`] | [`MatchError`] taxonomy, [`CoreResult`] alias |
//! | [`constants`] | Angle-unit conversion constants |
//!
//! # Features
//!
//! - **`serde`** — derives `Serialize`/`Deserialize` on [`Angle`] and
//!   [`UnitVec3`].

pub mod angle;
pub mod constants;
pub mod errors;
pub mod vector;

pub use angle::{validate_latitude_deg, validate_longitude_deg, wrap_longitude_deg, Angle};
pub use errors::{CoreResult, MatchError};
pub use vector::UnitVec3;
