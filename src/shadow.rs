//! # Umbral shadow test
//!
//! Determines whether a point lies inside the umbral shadow cone a primary
//! body casts away from an illuminating source (normally the Earth and the
//! Sun). Both vectors are expressed with the source at the origin.
//!
//! Geometry: with the primary at distance `d` from the source, project the
//! candidate point onto the primary's axis. A projection `x ≤ d` is sunward
//! of the primary and cannot be shadowed. Beyond the primary, the umbra
//! narrows linearly from the primary's radius down to zero where the source
//! disc would no longer be fully blocked:
//!
//! ```text
//! shadow_radius(x) = R_primary − (x − d)·(R_source − R_primary)/d
//! ```
//!
//! A negative shadow radius means the cone has already closed. Otherwise the
//! point is in shadow when its off-axis distance is under the cone radius.
//!
//! Degenerate near-zero-distance inputs are not specially guarded; callers
//! supply well-formed vectors.

use nalgebra::Vector3;

use crate::constants::{ERAU, SUN_RADIUS_AU};

/// Test whether `point` lies inside the umbral cone cast by a primary body.
///
/// Arguments
/// ---------
/// * `primary_loc`: position of the primary body, source at the origin (AU).
/// * `point`: candidate point in the same frame (AU).
/// * `source_radius_au`: physical radius of the illuminating source (AU).
/// * `primary_radius_au`: physical radius of the occulting primary (AU).
pub fn umbra_check(
    primary_loc: &Vector3<f64>,
    point: &Vector3<f64>,
    source_radius_au: f64,
    primary_radius_au: f64,
) -> bool {
    let primary_r = primary_loc.norm();
    let x = primary_loc.dot(point) / primary_r;

    if x > primary_r {
        let shadow_radius =
            primary_radius_au - (x - primary_r) * (source_radius_au - primary_radius_au) / primary_r;
        if shadow_radius > 0. {
            let off_axis = point - primary_loc * (x / primary_r);
            return off_axis.norm() < shadow_radius;
        }
    }
    false
}

/// Test whether a heliocentric point is inside the Earth's umbra.
///
/// Convenience wrapper over [`umbra_check`] with the solar and terrestrial
/// radii filled in; `earth_loc` and `point` are heliocentric, in AU.
pub fn earth_shadow(earth_loc: &Vector3<f64>, point: &Vector3<f64>) -> bool {
    umbra_check(earth_loc, point, SUN_RADIUS_AU, ERAU)
}
