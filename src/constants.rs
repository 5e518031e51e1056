//! # Constants and type definitions for Apparition
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `apparition` library.
//!
//! ## Overview
//!
//! - Astronomical constants (AU, solar gravitational parameter)
//! - Unit conversions (hours ↔ radians, degrees ↔ radians, days ↔ seconds)
//! - Core type aliases used across the crate
//! - Container type for the observation sequence consumed by the pipeline
//!
//! These definitions are used by all main modules, including the state estimator,
//! the two-body propagator, and the closest-approach search.

use crate::observations::Observation;
use smallvec::SmallVec;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Hours of right ascension → radians
pub const RADH: f64 = DPI / 24.0;

/// Heliocentric gravitational parameter GM☉ in km³/s²
pub const SUN_MU: f64 = 1.327_124_400_18e11;

/// Mean obliquity of the ecliptic at J2000.0, in radians.
/// Used to rotate the analytic Earth ephemeris into the equatorial frame.
pub const OBLIQUITY_J2000: f64 = 23.439_291_111 * RADEG;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in hours of right ascension
pub type Hour = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Speed in kilometers per second
pub type KmPerSec = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

/// Identifier of an observation row, assigned by the persistence layer.
pub type ObservationId = u64;

// -------------------------------------------------------------------------------------------------
// Data containers
// -------------------------------------------------------------------------------------------------

/// A small, inline-optimized container for the sightings of a single object.
pub type Observations = SmallVec<[Observation; 8]>;
