//! Assembly of the fixed-column observables line.
//!
//! One function per run builds each line from the per-step geometry of the
//! primary realization, in the canonical column order: date, RA, Dec,
//! delta, r, elongation, then every option-gated column. Widths come from
//! the formatter family; this module only concatenates validated cells.

use nalgebra::Vector3;

use crate::brightness::{apparent_magnitude, radar_snr_per_day, RADAR_ALBEDO};
use crate::constants::{Radian, AU, RADSEC, SECONDS_PER_DAY, MJD};
use crate::conversion::{format_ra, format_signed_dec, AnglePrecision};
use crate::formatters::{format_distance, format_motion, format_velocity, packed_si};
use crate::providers::PhaseFunction;
use crate::ref_system::{ecliptic_to_equatorial, vector_to_ra_dec};
use crate::shadow::earth_shadow;
use crate::step_size::StepSize;
use crate::time::{format_ephem_date, gmst, ra_dec_to_alt_az};
use crate::uncertainty::SkyPosition;

use super::{ground_track, EphemerisOptions, ObserverFrame, RunConfig, StepGeometry};

/// Run-invariant inputs of the observables renderer.
pub(super) struct ObservablesCtx<'a> {
    pub options: &'a EphemerisOptions,
    pub config: &'a RunConfig,
    pub frame: &'a ObserverFrame,
    pub step: StepSize,
    pub site_lat: Radian,
    pub show_alt_az: bool,
    pub show_visibility: bool,
    pub show_topocentric: bool,
    pub show_radar: bool,
    pub phase: &'a dyn PhaseFunction,
}

/// Sky position of a realization with the run's RA/Dec offsets applied.
pub(super) fn sky_position(config: &RunConfig, g: &StepGeometry) -> SkyPosition {
    let (ra, dec) = vector_to_ra_dec(&g.topo_equ);
    SkyPosition {
        ra: ra + config.ra_offset_arcsec * RADSEC,
        dec: dec + config.dec_offset_arcsec * RADSEC,
    }
}

struct MotionDetails {
    /// RA rate on the sky (cos δ applied), arcminutes/hour.
    ra_motion: f64,
    dec_motion: f64,
    total_motion: f64,
    /// Position angle of motion, degrees in [0, 360).
    position_angle: f64,
}

fn motion_details(topo: &Vector3<f64>, vel: &Vector3<f64>) -> MotionDetails {
    let r = topo.norm();
    let rho2 = topo.x * topo.x + topo.y * topo.y;
    let rho = rho2.sqrt();
    // rad/day rates of the spherical angles
    let ra_rate = (topo.x * vel.y - topo.y * vel.x) / rho2;
    let dec_rate = (vel.z * rho - topo.z * (topo.x * vel.x + topo.y * vel.y) / rho) / (r * r);

    let to_arcmin_per_hour = 180. * 60. / std::f64::consts::PI / 24.;
    let ra_motion = ra_rate * (rho / r) * to_arcmin_per_hour;
    let dec_motion = dec_rate * to_arcmin_per_hour;
    MotionDetails {
        ra_motion,
        dec_motion,
        total_motion: ra_motion.hypot(dec_motion),
        position_angle: ra_motion.atan2(dec_motion).to_degrees().rem_euclid(360.),
    }
}

/// Build one observables line for the primary realization.
///
/// Returns the line (no trailing newline), whether it should be shown, and
/// the sky position for the uncertainty fit. The caller handles the
/// suppressed-line placeholder and the trailing MOID/uncertainty cells.
pub(super) fn observables_line(
    ctx: &ObservablesCtx<'_>,
    curr: MJD,
    utc: MJD,
    g: &StepGeometry,
    obs_posn_equ: &Vector3<f64>,
    earth_moon: Option<&(Vector3<f64>, Vector3<f64>)>,
) -> (String, bool, SkyPosition) {
    let options = ctx.options;
    let config = ctx.config;
    let r = g.r;
    let solar_r = g.solar_r;
    let earth_r = obs_posn_equ.norm();
    let sky = sky_position(config, g);

    let gmst_rad = gmst(utc);
    let obj_aa = ra_dec_to_alt_az(sky.ra, sky.dec, ctx.site_lat, ctx.frame.longitude, gmst_rad);
    let sun_dir = -obs_posn_equ;
    let (sun_ra, sun_dec) = vector_to_ra_dec(&sun_dir);
    let sun_aa = ra_dec_to_alt_az(sun_ra, sun_dec, ctx.site_lat, ctx.frame.longitude, gmst_rad);

    // lunar data is optional; absent data disables the moon code, the
    // shadow test and the elongation column
    let mut moon_alt = None;
    let mut moon_more_than_half_lit = false;
    let mut is_in_shadow = false;
    let mut cos_lunar_elong = None;
    if let Some((earth_loc, moon_loc)) = earth_moon {
        let moon_geo = moon_loc - earth_loc;
        moon_more_than_half_lit = earth_loc.dot(&moon_geo) > 0.;
        let moon_equ = ecliptic_to_equatorial(&moon_geo);
        is_in_shadow = earth_shadow(earth_loc, &g.helio_lagged);
        cos_lunar_elong = Some(moon_equ.dot(&g.geo_equ) / (moon_equ.norm() * g.geo_equ.norm()));
        let (moon_ra, moon_dec) = vector_to_ra_dec(&moon_equ);
        moon_alt = Some(
            ra_dec_to_alt_az(moon_ra, moon_dec, ctx.site_lat, ctx.frame.longitude, gmst_rad).alt,
        );
    }

    let cos_elong =
        ((r * r + earth_r * earth_r - solar_r * solar_r) / (2. * earth_r * r)).clamp(-1., 1.);
    let elong_deg = cos_elong.acos().to_degrees();

    let (date_cell, ra_cell, dec_cell, r_cell, solar_cell) = if options.computer_friendly {
        (
            format!("{curr:13.5}"),
            format!("{:9.5}", sky.ra.to_degrees()),
            format!("{:9.5}", sky.dec.to_degrees()),
            format!("{r:14.9}"),
            format!("{solar_r:12.7}"),
        )
    } else {
        (
            format_ephem_date(curr, ctx.step.unit, ctx.step.digits),
            format_ra(
                sky.ra,
                AnglePrecision::Seconds {
                    digits: 3,
                    packed: false,
                },
            ),
            format_signed_dec(
                sky.dec,
                AnglePrecision::Seconds {
                    digits: 2,
                    packed: false,
                },
            ),
            format_distance(r, config.au_only_distances || ctx.show_radar),
            format_distance(solar_r, false),
        )
    };

    let mut line = format!("{date_cell}  {ra_cell}   {dec_cell} {r_cell}{solar_cell} {elong_deg:5.1}");

    if ctx.show_visibility {
        let sun_char = if sun_aa.alt > 0. {
            '*' // daylight
        } else if sun_aa.alt > (-6.0_f64).to_radians() {
            'C' // civil twilight
        } else if sun_aa.alt > (-12.0_f64).to_radians() {
            'N' // nautical twilight
        } else if sun_aa.alt > (-18.0_f64).to_radians() {
            'A' // astronomical twilight
        } else {
            ' ' // plain ol' night
        };
        let moon_char = match moon_alt {
            Some(alt) if alt > 0. => {
                if moon_more_than_half_lit {
                    'M'
                } else {
                    'm'
                }
            }
            _ => ' ',
        };
        line.push(' ');
        line.push(sun_char);
        line.push(moon_char);
    }

    // phase geometry runs even without an H value (the phase-angle column
    // does not need a magnitude)
    let mut show_this_line = true;
    let estimate = apparent_magnitude(
        config.abs_mag.unwrap_or(0.),
        ctx.phase,
        solar_r,
        r,
        earth_r,
        config.is_comet,
    );
    if config.abs_mag.is_some() && estimate.value > config.mag_limit {
        show_this_line = false;
    }

    if options.phase_angle {
        line.push_str(&format!(" {:8.4}", estimate.phase_angle.to_degrees()));
    }
    if options.phase_angle_bisector {
        let pab = g.topo_ecl / r + g.helio_lagged / solar_r;
        let (pab_lon, pab_lat) = vector_to_ra_dec(&pab);
        line.push_str(&format!(
            " {:8.4} {:8.4}",
            pab_lon.to_degrees(),
            pab_lat.to_degrees()
        ));
    }
    if options.helio_ecliptic {
        let (lon, lat) = vector_to_ra_dec(&g.helio_lagged);
        line.push_str(&format!(" {:8.4} {:8.4}", lon.to_degrees(), lat.to_degrees()));
    }
    if options.topo_ecliptic {
        let (lon, lat) = vector_to_ra_dec(&g.topo_ecl);
        line.push_str(&format!(" {:8.4} {:8.4}", lon.to_degrees(), lat.to_degrees()));
    }
    if config.abs_mag.is_some() {
        if is_in_shadow {
            line.push_str(" Sha ");
        } else {
            if estimate.value < 99. && estimate.value > -9.9 {
                line.push_str(&format!(" {:4.1}", estimate.value + 0.05));
            } else {
                line.push_str(&format!(" {:3} ", (estimate.value + 0.5) as i64));
            }
            if estimate.doubtful {
                // signal a doubtful magnitude
                let mut b = line.into_bytes();
                let n = b.len();
                b[n - 1] = b'?';
                if b[n - 2] == b'.' {
                    b[n - 2] = b'?';
                }
                line = String::from_utf8(b).expect("ascii formatting");
            }
        }
    }
    if options.lunar_elongation {
        match cos_lunar_elong {
            Some(c) => line.push_str(&format!("{:6.1}", c.clamp(-1., 1.).acos().to_degrees())),
            None => line.push_str("   n/a"),
        }
    }
    if options.motion {
        let m = motion_details(&g.topo_equ, &g.topo_vel_equ);
        if options.separate_motions {
            line.push_str(&format!(
                " {} {}",
                format_motion(m.ra_motion),
                format_motion(m.dec_motion)
            ));
        } else {
            line.push_str(&format!(
                " {} {:5.1} ",
                format_motion(m.total_motion),
                m.position_angle
            ));
        }
    }
    if ctx.show_alt_az {
        line.push_str(&format!(
            " {}{:02} {:03}",
            if obj_aa.alt > 0. { '+' } else { '-' },
            (obj_aa.alt.to_degrees().abs() + 0.5) as i64,
            (obj_aa.az.to_degrees() + 0.5) as i64
        ));
    }
    if options.radial_velocity {
        let kms = g.radial_vel * AU / SECONDS_PER_DAY;
        if options.computer_friendly {
            line.push_str(&format!("{kms:12.6}"));
        } else {
            line.push_str(&format_velocity(kms));
        }
    }
    if ctx.show_radar {
        if obj_aa.alt < 0. {
            line.push_str("  n/a");
        } else if let (Some(radar), Some(h)) = (&config.radar, config.abs_mag) {
            let snr = radar_snr_per_day(radar, h, RADAR_ALBEDO, r);
            line.push(' ');
            line.push_str(&packed_si(snr));
        }
    }
    if options.ground_track {
        let (lon, lat, alt_m) = ground_track(&g.geo_equ, gmst_rad, ctx.frame.body);
        line.push_str(&format!(
            "{:9.4} {:+08.4} {:10.3}",
            lon.to_degrees(),
            lat.to_degrees(),
            alt_m / 1000.
        ));
    }
    if options.space_velocity {
        let kms = g.topo_vel_equ.norm() * AU / SECONDS_PER_DAY;
        line.push_str(&format_velocity(kms));
    }

    if options.suppress_unobservable {
        if ctx.show_radar {
            // for radar, "observable" = object above the station's cutoff
            if let Some(radar) = &config.radar {
                show_this_line = obj_aa.alt > radar.altitude_limit;
            }
        } else if ctx.show_topocentric && show_this_line {
            // "observable" = object above the horizon, sun below it
            show_this_line = obj_aa.alt > 0. && sun_aa.alt < 0.;
        }
    }

    (line, show_this_line, sky)
}

#[cfg(test)]
mod observables_test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_motion_details_pure_dec_drift() {
        // object on the x axis drifting toward +z: all motion in Dec,
        // position angle 0 (due north)
        let topo = Vector3::new(1., 0., 0.);
        let vel = Vector3::new(0., 0., 1e-3);
        let m = motion_details(&topo, &vel);
        assert_abs_diff_eq!(m.ra_motion, 0., epsilon = 1e-12);
        assert!(m.dec_motion > 0.);
        assert_relative_eq!(m.total_motion, m.dec_motion, max_relative = 1e-12);
        assert_abs_diff_eq!(m.position_angle, 0., epsilon = 1e-9);
    }

    #[test]
    fn test_motion_details_pure_ra_drift() {
        // drift toward +y seen from the origin: all motion in RA, PA 90°
        let topo = Vector3::new(1., 0., 0.);
        let vel = Vector3::new(0., 1e-3, 0.);
        let m = motion_details(&topo, &vel);
        assert_abs_diff_eq!(m.dec_motion, 0., epsilon = 1e-12);
        // 1e-3 rad/day at dec 0 is (1e-3 · 3437.75…)/24 arcmin/hr
        assert_relative_eq!(
            m.ra_motion,
            1e-3 * 180. * 60. / std::f64::consts::PI / 24.,
            max_relative = 1e-12
        );
        assert_abs_diff_eq!(m.position_angle, 90., epsilon = 1e-9);
    }
}
