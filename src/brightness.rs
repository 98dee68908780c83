//! # Apparent magnitude and radar signal estimation
//!
//! Two estimators the observables output mode relies on:
//!
//! - **Apparent magnitude**: absolute magnitude plus a phase/distance term
//!   supplied by a [`PhaseFunction`](crate::providers::PhaseFunction)
//!   collaborator. Values are clamped at 999 (objects at near-zero
//!   elongation would otherwise overflow the column), and magnitudes
//!   computed at phase angles beyond 120° are flagged as doubtful for
//!   non-cometary bodies, where the H-G system is unreliable.
//! - **Radar SNR/day**: ground-based radar signal-to-noise per day of
//!   integration, from a per-station [`RadarProfile`]. Diameter is derived
//!   from the absolute magnitude under an assumed optical albedo; rotation
//!   period is a heuristic in H (smaller rocks spin faster). The SNR is
//!   proportional to
//!
//!   ```text
//!   k · radar_albedo · √(P_hours · D_m) · D_m / r⁴ · P_tx · gain / T_sys
//!   ```
//!
//!   Since SNR depends only on the square root of the period, a factor-two
//!   error in the period guess costs √2 in SNR; albedo and H errors
//!   dominate in practice.

use nom::{
    character::complete::char,
    number::complete::double,
    sequence::tuple,
    IResult,
};

use crate::constants::{Meter, Radian, RADEG};
use crate::ephemerix_errors::EphemerixError;
use crate::providers::PhaseFunction;

/// Assumed optical albedo when deriving a diameter from H.
pub const OPTICAL_ALBEDO: f64 = 0.1;

/// Assumed radar albedo (radar cross section over projected area).
pub const RADAR_ALBEDO: f64 = 0.1;

/// Diameter in meters from absolute magnitude and optical albedo.
///
/// An object with H = 0 and 100% albedo is taken to be 1300 km across.
pub fn diameter_from_abs_mag(abs_mag: f64, optical_albedo: f64) -> Meter {
    1300. * 1000. * 0.1_f64.powf(abs_mag / 5.) / optical_albedo.sqrt()
}

/// Heuristic rotation period as a function of absolute magnitude.
///
/// Three hours for H ≤ 21, 0.3 hours (18 minutes) for H ≥ 25, linear
/// interpolation in between.
pub fn rotation_period_hours(abs_mag: f64) -> f64 {
    const BIG_LIMIT: f64 = 21.;
    const BIG_PERIOD: f64 = 3.;
    const SMALL_LIMIT: f64 = 25.;
    const SMALL_PERIOD: f64 = 0.3;

    if abs_mag < BIG_LIMIT {
        BIG_PERIOD
    } else if abs_mag < SMALL_LIMIT {
        SMALL_PERIOD
            + (BIG_PERIOD - SMALL_PERIOD) * (SMALL_LIMIT - abs_mag) / (SMALL_LIMIT - BIG_LIMIT)
    } else {
        SMALL_PERIOD
    }
}

/// An apparent-magnitude estimate with its reliability flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnitudeEstimate {
    /// Apparent magnitude, clamped to at most 999.
    pub value: f64,
    /// Phase angle used for the estimate, in radians.
    pub phase_angle: Radian,
    /// True when the phase angle exceeds 120° on a non-cometary body.
    pub doubtful: bool,
}

/// Combine an absolute magnitude with a collaborator phase/distance term.
///
/// Arguments
/// ---------
/// * `abs_mag`: absolute magnitude H.
/// * `phase_fn`: phase/distance collaborator.
/// * `solar_r`: object heliocentric distance (AU), after light-time lag.
/// * `delta`: observer-object distance (AU).
/// * `earth_r`: observer heliocentric distance (AU).
/// * `is_comet`: suppresses the doubtful marker (comet laws stay usable at
///   large phase angles).
pub fn apparent_magnitude<P: PhaseFunction + ?Sized>(
    abs_mag: f64,
    phase_fn: &P,
    solar_r: f64,
    delta: f64,
    earth_r: f64,
    is_comet: bool,
) -> MagnitudeEstimate {
    let (dmag, phase_angle) = phase_fn.phase_and_distance(solar_r, delta, earth_r);
    let value = (abs_mag + dmag).min(999.);
    MagnitudeEstimate {
        value,
        phase_angle,
        doubtful: phase_angle > std::f64::consts::PI * 2. / 3. && !is_comet,
    }
}

/// Standard asteroid H-G phase/distance law.
///
/// Implements the IAU two-parameter magnitude system with the usual
/// Φ₁/Φ₂ exponential approximations; `slope` is the G parameter
/// (0.15 by default).
#[derive(Debug, Clone, Copy)]
pub struct HgPhaseFunction {
    pub slope: f64,
}

impl Default for HgPhaseFunction {
    fn default() -> Self {
        HgPhaseFunction { slope: 0.15 }
    }
}

fn phase_angle_from_triangle(solar_r: f64, delta: f64, earth_r: f64) -> Radian {
    let cos_phase =
        ((delta * delta + solar_r * solar_r - earth_r * earth_r) / (2. * delta * solar_r))
            .clamp(-1., 1.);
    cos_phase.acos()
}

impl PhaseFunction for HgPhaseFunction {
    fn phase_and_distance(&self, solar_r: f64, delta: f64, earth_r: f64) -> (f64, Radian) {
        let phase = phase_angle_from_triangle(solar_r, delta, earth_r);
        let half_tan = (phase / 2.).tan();
        let phi1 = (-3.33 * half_tan.powf(0.63)).exp();
        let phi2 = (-1.87 * half_tan.powf(1.22)).exp();
        let phase_term = ((1. - self.slope) * phi1 + self.slope * phi2).max(1e-300);
        let dmag = 5. * (solar_r * delta).log10() - 2.5 * phase_term.log10();
        (dmag, phase)
    }
}

/// Cometary magnitude law: 5·log₁₀Δ + 2.5·n·log₁₀r with n = 4 by default.
#[derive(Debug, Clone, Copy)]
pub struct CometPhaseFunction {
    pub activity_index: f64,
}

impl Default for CometPhaseFunction {
    fn default() -> Self {
        CometPhaseFunction { activity_index: 4. }
    }
}

impl PhaseFunction for CometPhaseFunction {
    fn phase_and_distance(&self, solar_r: f64, delta: f64, earth_r: f64) -> (f64, Radian) {
        let phase = phase_angle_from_triangle(solar_r, delta, earth_r);
        let dmag = 5. * delta.log10() + 2.5 * self.activity_index * solar_r.log10();
        (dmag, phase)
    }
}

/// Per-station radar parameters, invariant over a run.
///
/// Loaded from a configuration entry of the form
/// `power_W,Tsys_K,gain_K_per_Jy,altitude_cutoff_deg,calibration_constant`
/// keyed by the 3-character station code. The altitude cutoff is normalized
/// to radians exactly once, here at parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarProfile {
    pub power_w: f64,
    pub system_temp_k: f64,
    pub gain: f64,
    pub altitude_limit: Radian,
    pub radar_constant: f64,
}

fn radar_entry(input: &str) -> IResult<&str, (f64, f64, f64, f64, f64)> {
    let (input, (p, _, t, _, g, _, alt, _, k)) = tuple((
        double,
        char(','),
        double,
        char(','),
        double,
        char(','),
        double,
        char(','),
        double,
    ))(input)?;
    Ok((input, (p, t, g, alt, k)))
}

impl RadarProfile {
    /// Parse a station configuration entry.
    ///
    /// Errors
    /// ----------
    /// * [`EphemerixError::InvalidRadarProfile`] on malformed entries or
    ///   non-positive power/temperature (defect data, not a runtime state).
    pub fn from_config_entry(entry: &str) -> Result<RadarProfile, EphemerixError> {
        let (rest, (power_w, system_temp_k, gain, alt_deg, radar_constant)) =
            radar_entry(entry.trim())
                .map_err(|_| EphemerixError::InvalidRadarProfile(entry.to_string()))?;
        if !rest.trim().is_empty() || power_w <= 0. || system_temp_k <= 0. {
            return Err(EphemerixError::InvalidRadarProfile(entry.to_string()));
        }
        Ok(RadarProfile {
            power_w,
            system_temp_k,
            gain,
            altitude_limit: alt_deg * RADEG,
            radar_constant,
        })
    }
}

/// Radar signal-to-noise ratio per day of integration.
///
/// `dist` is the observer-object distance in AU. Callers gate this on the
/// station's altitude cutoff; below it the column reads `n/a` instead.
pub fn radar_snr_per_day(
    profile: &RadarProfile,
    abs_mag: f64,
    radar_albedo: f64,
    dist: f64,
) -> f64 {
    let rotation_period = rotation_period_hours(abs_mag);
    let diameter_m = diameter_from_abs_mag(abs_mag, OPTICAL_ALBEDO);
    let mut snr = profile.radar_constant
        * radar_albedo
        * (rotation_period * diameter_m).sqrt()
        * diameter_m
        / dist.powi(4);
    snr *= profile.power_w * profile.gain;
    snr /= profile.system_temp_k;
    snr
}

#[cfg(test)]
mod brightness_test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_diameter_from_abs_mag() {
        // H = 0, albedo 1: the 1300 km reference diameter
        assert_abs_diff_eq!(diameter_from_abs_mag(0., 1.), 1_300_000.0, epsilon = 1e-6);
        // five magnitudes is a factor of ten in diameter
        assert_relative_eq!(
            diameter_from_abs_mag(5., 1.),
            130_000.0,
            max_relative = 1e-12
        );
        // lower albedo means bigger rock for the same H
        assert!(diameter_from_abs_mag(20., 0.05) > diameter_from_abs_mag(20., 0.25));
    }

    #[test]
    fn test_rotation_period_ladder() {
        assert_eq!(rotation_period_hours(15.), 3.0);
        assert_eq!(rotation_period_hours(21.), 3.0);
        assert_eq!(rotation_period_hours(26.), 0.3);
        assert_abs_diff_eq!(rotation_period_hours(23.), 1.65, epsilon = 1e-12);
    }

    #[test]
    fn test_magnitude_clamp_and_doubt() {
        let hg = HgPhaseFunction::default();
        // opposition-ish geometry: no doubt flag, sensible magnitude
        let m = apparent_magnitude(18., &hg, 2.0, 1.0, 1.0, false);
        assert!(!m.doubtful);
        assert!(m.value > 18. && m.value < 25.);

        // object between Sun and observer: huge phase angle
        let m = apparent_magnitude(18., &hg, 0.05, 0.96, 1.0, false);
        assert!(m.phase_angle > std::f64::consts::PI * 2. / 3.);
        assert!(m.doubtful);
        assert!(m.value <= 999.);

        // same geometry on a comet: no doubt marker
        let comet = CometPhaseFunction::default();
        let m = apparent_magnitude(10., &comet, 0.05, 0.96, 1.0, true);
        assert!(!m.doubtful);
    }

    #[test]
    fn test_radar_profile_parse() {
        // Arecibo-like entry
        let p = RadarProfile::from_config_entry("500000,25,10,70.5,1e-11").unwrap();
        assert_eq!(p.power_w, 500000.);
        assert_eq!(p.system_temp_k, 25.);
        assert_eq!(p.gain, 10.);
        assert_abs_diff_eq!(p.altitude_limit, 70.5 * RADEG, epsilon = 1e-15);
        assert_eq!(p.radar_constant, 1e-11);

        assert!(RadarProfile::from_config_entry("500000,25,10").is_err());
        assert!(RadarProfile::from_config_entry("0,25,10,70.5,1e-11").is_err());
        assert!(RadarProfile::from_config_entry("garbage").is_err());
    }

    #[test]
    fn test_snr_distance_scaling() {
        let p = RadarProfile::from_config_entry("500000,25,10,70.5,1e-11").unwrap();
        let near = radar_snr_per_day(&p, 20., RADAR_ALBEDO, 0.05);
        let far = radar_snr_per_day(&p, 20., RADAR_ALBEDO, 0.1);
        // r^4 law
        assert_relative_eq!(near / far, 16.0, max_relative = 1e-10);
    }
}
