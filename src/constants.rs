//! # Constants and type definitions for Ephemerix
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `ephemerix` library, along with the registered radius and
//! axis-ratio data for the solar-system bodies an observing site may be fixed to.
//!
//! ## Overview
//!
//! - Astronomical and geophysical constants
//! - Unit conversions (degrees ↔ radians, days ↔ seconds, AU ↔ km)
//! - Core type aliases used across the crate
//! - Per-body equatorial radius and polar/equatorial axis ratio tables
//!
//! These definitions are used by all main modules, including the parallax converter, the
//! shadow tester, and the ephemeris stepper.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of hours in a day
pub const HOURS_PER_DAY: f64 = 24.0;

/// Number of minutes in a day
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// Astronomical Unit in meters
pub const AU_M: f64 = AU * 1000.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Radians → arcseconds
pub const RAD2ARC: f64 = 1.0 / RADSEC;

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Earth polar radius in meters (GRS1980/WGS84)
pub const EARTH_MINOR_AXIS: f64 = 6_356_752.3;

/// Earth equatorial radius expressed in astronomical units
pub const ERAU: f64 = EARTH_MAJOR_AXIS / AU_M;

/// Solar photospheric radius in kilometers
pub const SUN_RADIUS_KM: f64 = 696_000.0;

/// Solar radius expressed in astronomical units
pub const SUN_RADIUS_AU: f64 = SUN_RADIUS_KM / AU;

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Speed of light in astronomical units per day
pub const VLIGHT_AU: f64 = VLIGHT / AU * SECONDS_PER_DAY;

/// One light-year in kilometers
pub const LIGHT_YEAR_KM: f64 = VLIGHT * SECONDS_PER_DAY * 365.25;

/// Mean obliquity of the ecliptic at J2000.0, in radians (IAU 1976)
pub const OBLIQUITY_J2000: f64 = 23.43929111 * RADEG;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in meters
pub type Meter = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

// -------------------------------------------------------------------------------------------------
// Registered body data
// -------------------------------------------------------------------------------------------------

/// Index of a solar-system body an observing site may be fixed to.
///
/// Follows the conventional numbering: 0 = Sun, 1..=9 = Mercury through Pluto,
/// 10 = Moon. All indices in this range have registered radius and axis-ratio
/// data; callers must not pass anything else to the geometry kernels.
pub type BodyIndex = usize;

/// Earth's index in the registered body table.
pub const EARTH: BodyIndex = 3;

/// Equatorial radii in meters for bodies 0..=10 (Sun, Mercury..Pluto, Moon).
const BODY_RADII_M: [f64; 11] = [
    SUN_RADIUS_KM * 1000.0,
    2_440_500.0,      // Mercury
    6_051_800.0,      // Venus
    EARTH_MAJOR_AXIS, // Earth
    3_396_200.0,      // Mars
    71_492_000.0,     // Jupiter
    60_268_000.0,     // Saturn
    25_559_000.0,     // Uranus
    24_764_000.0,     // Neptune
    1_188_300.0,      // Pluto
    1_738_100.0,      // Moon
];

/// Polar-to-equatorial axis ratios for bodies 0..=10.
const BODY_AXIS_RATIOS: [f64; 11] = [
    1.0,                                 // Sun
    0.999_6,                             // Mercury
    1.0,                                 // Venus
    EARTH_MINOR_AXIS / EARTH_MAJOR_AXIS, // Earth
    0.994_23,                            // Mars
    0.935_13,                            // Jupiter
    0.902_00,                            // Saturn
    0.977_07,                            // Uranus
    0.982_93,                            // Neptune
    1.0,                                 // Pluto
    0.998_87,                            // Moon
];

/// Equatorial radius of a registered body, in meters.
///
/// Total over the registered range 0..=10; see [`BodyIndex`].
pub fn planet_radius_m(body: BodyIndex) -> Meter {
    BODY_RADII_M[body]
}

/// Equatorial radius of a registered body, in astronomical units.
pub fn planet_radius_au(body: BodyIndex) -> f64 {
    BODY_RADII_M[body] / AU_M
}

/// Polar/equatorial axis ratio of a registered body (1.0 for a sphere).
pub fn planet_axis_ratio(body: BodyIndex) -> f64 {
    BODY_AXIS_RATIOS[body]
}
