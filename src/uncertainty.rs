//! # Uncertainty-ellipse fitting over orbit realizations
//!
//! Given the sky positions of N orbit realizations at a common epoch, fits
//! the 1-σ position-uncertainty ellipse: samples are projected onto a local
//! tangent plane centered on realization 0 (RA offsets corrected by
//! cos δ, both axes scaled to arcseconds), the 2×2 sample covariance is
//! formed, and its eigenvalues are solved analytically from the
//! characteristic quadratic. The major semi-axis is √z₁ (converted back to
//! radians) and the position angle is measured from the RA axis toward Dec.
//!
//! With exactly two realizations the covariance detour is skipped: the
//! two-point separation and bearing carry the same information.
//!
//! The ordering z₁ ≥ z₂ is a domain invariant; a violation can only come
//! from numerical corruption of the inputs and is surfaced as
//! [`EphemerixError::EllipseOrdering`].

use nalgebra::Vector2;

use crate::constants::{Radian, DPI, RAD2ARC};
use crate::ephemerix_errors::EphemerixError;

/// A right ascension / declination pair, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    pub ra: Radian,
    pub dec: Radian,
}

/// Fitted covariance ellipse of a set of sky positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UncertaintyEllipse {
    /// Major semi-axis, in radians.
    pub major_axis: Radian,
    /// Minor semi-axis, in radians (zero for the two-point fit).
    pub minor_axis: Radian,
    /// Position angle of the major axis, radians from the RA axis toward Dec
    /// (meaningful modulo π).
    pub position_angle: Radian,
}

/// Normalize an angle difference to (−π, π].
fn centralize_ang(mut ang: Radian) -> Radian {
    ang %= DPI;
    if ang > std::f64::consts::PI {
        ang -= DPI;
    } else if ang <= -std::f64::consts::PI {
        ang += DPI;
    }
    ang
}

/// Tangent-plane offset of `p` from `origin`, in arcseconds.
fn tangent_offset(origin: &SkyPosition, p: &SkyPosition) -> Vector2<f64> {
    let dx = centralize_ang(p.ra - origin.ra) * origin.dec.cos() * RAD2ARC;
    let dy = (p.dec - origin.dec) * RAD2ARC;
    Vector2::new(dx, dy)
}

/// Fit the uncertainty ellipse of `positions` (N ≥ 2, common epoch).
///
/// Errors
/// ----------
/// * [`EphemerixError::NotEnoughRealizations`] for N < 2.
/// * [`EphemerixError::EllipseOrdering`] when the analytic eigenvalues come
///   out unordered — a precision defect in the inputs, not a valid outcome.
pub fn uncertainty_ellipse(positions: &[SkyPosition]) -> Result<UncertaintyEllipse, EphemerixError> {
    let n = positions.len();
    if n < 2 {
        return Err(EphemerixError::NotEnoughRealizations(n));
    }
    if n == 2 {
        // Direct two-point separation and bearing; equivalent to the
        // covariance fit but cheaper.
        let off = tangent_offset(&positions[0], &positions[1]);
        return Ok(UncertaintyEllipse {
            major_axis: off.norm() / RAD2ARC,
            minor_axis: 0.,
            position_angle: off.y.atan2(off.x),
        });
    }

    // Realization 0 contributes the zero offset; the mean still runs over
    // all N samples.
    let offsets: Vec<Vector2<f64>> = positions
        .iter()
        .map(|p| tangent_offset(&positions[0], p))
        .collect();
    let mean = offsets.iter().sum::<Vector2<f64>>() / n as f64;

    let (mut sum_x2, mut sum_xy, mut sum_y2) = (0., 0., 0.);
    for off in &offsets {
        let d = off - mean;
        sum_x2 += d.x * d.x;
        sum_xy += d.x * d.y;
        sum_y2 += d.y * d.y;
    }
    sum_x2 /= n as f64;
    sum_xy /= n as f64;
    sum_y2 /= n as f64;

    // Eigenvalues are the zeroes of z² − (Σx² + Σy²)z + Σx²Σy² − (Σxy)².
    let b = -(sum_x2 + sum_y2);
    let c = sum_x2 * sum_y2 - sum_xy * sum_xy;
    let discrim = b * b - 4. * c;
    if !(discrim >= 0.) {
        return Err(EphemerixError::EllipseOrdering {
            z1: f64::NAN,
            z2: f64::NAN,
        });
    }
    let z1 = (-b + discrim.sqrt()) * 0.5;
    let z2 = c / z1;
    if !(z1 >= z2) {
        return Err(EphemerixError::EllipseOrdering { z1, z2 });
    }

    Ok(UncertaintyEllipse {
        major_axis: z1.sqrt() / RAD2ARC,
        minor_axis: z2.max(0.).sqrt() / RAD2ARC,
        position_angle: sum_xy.atan2(sum_x2 - z2),
    })
}
