//! # Reference-frame rotations
//!
//! Orbit and observer states move through the crate in heliocentric
//! ecliptic J2000 coordinates; sky positions are reported in equatorial
//! J2000. The two frames differ by a single rotation about the x axis by
//! the J2000 mean obliquity, applied here. Precession and nutation of the
//! output frame are out of scope: everything stays referred to J2000.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, DPI, OBLIQUITY_J2000};

/// Rotation matrix by `alpha` radians about coordinate axis `k` (0 = x,
/// 1 = y, 2 = z).
pub fn rotmt(alpha: f64, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("**** ROTMT: invalid axis index {k} (must be 0,1,2) ****"),
    };
    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotate a vector from ecliptic J2000 to equatorial J2000 coordinates.
pub fn ecliptic_to_equatorial(v: &Vector3<f64>) -> Vector3<f64> {
    rotmt(OBLIQUITY_J2000, 0) * v
}

/// Rotate a vector from equatorial J2000 to ecliptic J2000 coordinates.
pub fn equatorial_to_ecliptic(v: &Vector3<f64>) -> Vector3<f64> {
    rotmt(-OBLIQUITY_J2000, 0) * v
}

/// Spherical angles of a Cartesian direction: `(ra, dec)` with the right
/// ascension normalized to [0, 2π).
pub fn vector_to_ra_dec(v: &Vector3<f64>) -> (Radian, Radian) {
    let ra = v.y.atan2(v.x).rem_euclid(DPI);
    let dec = (v.z / v.norm()).clamp(-1., 1.).asin();
    (ra, dec)
}
