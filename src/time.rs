//! # Time scales, sidereal time and date-column rendering
//!
//! Epochs move through the crate as Modified Julian Dates (`f64` days),
//! with [`hifitime`] handling the TT/UTC boundary and Gregorian
//! conversions. The date column of an ephemeris is rendered at a precision
//! inferred from the step size: a run stepped in whole days never shows a
//! time of day, a run stepped at `0.001d` shows three fractional-day
//! digits, and hour/minute/second steps switch to an `HH`, `HH:MM` or
//! `HH:MM:SS` clock with the step's fractional digits on its last field.

use hifitime::{Epoch, TimeScale};

use crate::constants::{DPI, HOURS_PER_DAY, MINUTES_PER_DAY, SECONDS_PER_DAY, T2000, MJD};
use crate::step_size::StepUnit;

/// Convert an MJD from TT to UTC.
pub fn tt_to_utc_mjd(tt: MJD) -> MJD {
    Epoch::from_mjd_in_time_scale(tt, TimeScale::TT).to_mjd_utc_days()
}

/// Convert an MJD from UTC to TT.
pub fn utc_to_tt_mjd(utc: MJD) -> MJD {
    Epoch::from_mjd_utc(utc).to_mjd_tt_days()
}

/// Greenwich Mean Sidereal Time in radians, normalized to [0, 2π).
///
/// IAU 1982 polynomial for GMST at 0h UT1 plus the rotation accumulated
/// over the fraction of the day, scaled by the solar-to-sidereal day ratio.
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (UT1; UTC is close enough for the
///   visibility and ground-track uses in this crate).
pub fn gmst(tjm: f64) -> f64 {
    // GMST at 0h UT1, in seconds of sidereal time
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;
    // sidereal days per solar day
    const RAP: f64 = 1.00273790934;

    let day = tjm.floor();
    let t = (day - T2000) / 36525.0;
    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;
    let gmst = gmst0 + tjm.fract() * DPI * RAP;
    gmst - (gmst / DPI).floor() * DPI
}

/// Calendar date plus the count of smallest-field ticks since midnight
/// (`10^digits` ticks per unit), after the half-up precision shift.
fn clock_ticks(mjd_utc: MJD, units_per_day: f64, digits: usize) -> (String, i64, i64) {
    let power = 10_f64.powi(digits as i32);
    let shifted = mjd_utc + 0.5 / (units_per_day * power);
    let day = shifted.floor();
    let (y, m, d, ..) = Epoch::from_mjd_utc(day).to_gregorian_utc();
    (
        format!("{y:4} {m:02} {d:02}"),
        ((shifted - day) * units_per_day * power) as i64,
        power as i64,
    )
}

fn with_fraction(mut s: String, frac: i64, digits: usize) -> String {
    if digits > 0 {
        s.push('.');
        s.push_str(&format!("{frac:0digits$}"));
    }
    s
}

/// Render an epoch (MJD UTC) for the date column of an ephemeris.
///
/// `unit` and `digits` come straight from the parsed step size and select
/// exactly the fields the column header advertises: `YYYY MM DD` for
/// day-scale units, then `HH`, `HH:MM` or `HH:MM:SS` for clock units, with
/// `digits` fractional digits appended to the smallest field. Rounding is
/// half-up at the displayed precision, so a step landing a hair before
/// midnight prints as the next day rather than `23:59` of the previous one.
pub fn format_ephem_date(mjd_utc: MJD, unit: StepUnit, digits: usize) -> String {
    match unit {
        StepUnit::Days | StepUnit::Weeks | StepUnit::Years => {
            let (date, ticks, _) = clock_ticks(mjd_utc, 1., digits);
            with_fraction(date, ticks, digits)
        }
        StepUnit::Hours => {
            let (date, ticks, power) = clock_ticks(mjd_utc, HOURS_PER_DAY, digits);
            with_fraction(format!("{date} {:02}", ticks / power), ticks % power, digits)
        }
        StepUnit::Minutes => {
            let (date, ticks, power) = clock_ticks(mjd_utc, MINUTES_PER_DAY, digits);
            with_fraction(
                format!("{date} {:02}:{:02}", ticks / (60 * power), (ticks / power) % 60),
                ticks % power,
                digits,
            )
        }
        StepUnit::Seconds => {
            let (date, ticks, power) = clock_ticks(mjd_utc, SECONDS_PER_DAY, digits);
            with_fraction(
                format!(
                    "{date} {:02}:{:02}:{:02}",
                    ticks / (3600 * power),
                    (ticks / power / 60) % 60,
                    (ticks / power) % 60
                ),
                ticks % power,
                digits,
            )
        }
    }
}

/// Horizontal coordinates of a sky position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltAz {
    /// Altitude above the horizon, radians.
    pub alt: f64,
    /// Azimuth from north through east, radians in [0, 2π).
    pub az: f64,
    /// Hour angle, radians.
    pub hour_angle: f64,
}

/// Convert equatorial coordinates to horizontal ones for a site.
///
/// Arguments
/// ---------
/// * `ra`, `dec`: equatorial position, radians.
/// * `lat`, `lon`: geodetic site coordinates, radians (east longitude
///   positive).
/// * `gmst_rad`: Greenwich sidereal time from [`gmst`].
pub fn ra_dec_to_alt_az(ra: f64, dec: f64, lat: f64, lon: f64, gmst_rad: f64) -> AltAz {
    let hour_angle = gmst_rad + lon - ra;
    let sin_alt = lat.sin() * dec.sin() + lat.cos() * dec.cos() * hour_angle.cos();
    let alt = sin_alt.clamp(-1., 1.).asin();
    // measured from south, westward positive
    let az_south = hour_angle
        .sin()
        .atan2(hour_angle.cos() * lat.sin() - dec.tan() * lat.cos());
    let az = (az_south + std::f64::consts::PI).rem_euclid(DPI);
    AltAz {
        alt,
        az,
        hour_angle,
    }
}
