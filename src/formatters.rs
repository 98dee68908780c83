//! # Adaptive fixed-width numeric formatters
//!
//! Pure mapping functions from a numeric quantity to a fixed-width text
//! field whose unit and precision are chosen by magnitude range. Every
//! function is total: quantities beyond the representable ladder render a
//! saturation marker instead of erroring, and the run continues.
//!
//! All outputs are right-justified owned strings of a fixed byte length
//! (asserted in debug builds), with the leading zero of sub-unit magnitudes
//! stripped (`.1234`, not `0.1234`).

use crate::constants::{AU, LIGHT_YEAR_KM, VLIGHT};

/// SI prefixes used past kilo; everything after yotta is made up, but keeps
/// absurd debugging magnitudes representable.
const SI_PREFIXES: &[u8] = b"kMGTPEZYXWVUSRQONLJIHFDCBA";

fn strip_leading_zero(s: String) -> String {
    let mut b = s.into_bytes();
    if b.first() == Some(&b'0') {
        b[0] = b' ';
    }
    String::from_utf8(b).expect("ascii formatting")
}

/// Format a distance in AU into a 7-character AU-only field.
///
/// Four significant digits for one to ten AU, five below one AU (an extra
/// digit over the historical MPC convention), coarser above.
pub fn show_dist_in_au(dist_in_au: f64) -> String {
    let s = if dist_in_au > 999.999 {
        format!("{dist_in_au:7.1}") // " 1234.5"
    } else if dist_in_au > 99.999 {
        format!("{dist_in_au:7.2}") // " 123.45"
    } else if dist_in_au > 9.999 {
        format!("{dist_in_au:7.3}") // " 12.345"
    } else if dist_in_au > 0.99 {
        format!("{dist_in_au:7.4}") // " 1.2345"
    } else {
        format!("{dist_in_au:7.5}") // " .12345"
    };
    let s = strip_leading_zero(s);
    debug_assert_eq!(s.len(), 7);
    s
}

fn show_dist_in_light_years(dist_in_au: f64) -> String {
    let mut ly = dist_in_au * AU / LIGHT_YEAR_KM;
    if ly > 9999.9 {
        ly /= 1000.;
        let mut idx = 0;
        while idx < SI_PREFIXES.len() && ly > 999. {
            ly /= 1000.;
            idx += 1;
        }
        if idx == SI_PREFIXES.len() {
            // can't represent this even in our largest made-up units
            " <HUGE>".to_string()
        } else {
            let s = if ly < 9.9 {
                format!("{ly:4.1}xLY")
            } else {
                format!("{ly:4.0}xLY")
            };
            let mut b = s.into_bytes();
            b[4] = SI_PREFIXES[idx];
            String::from_utf8(b).expect("ascii formatting")
        }
    } else if ly > 99.999 {
        format!("{ly:5.0}LY")
    } else if ly > 9.999 {
        format!("{ly:5.1}LY")
    } else if ly > 0.999 {
        format!("{ly:5.2}LY")
    } else {
        format!("{ly:5.3}LY")
    }
}

/// Format a distance (AU) into a seven-character field with adaptive units.
///
/// Kilometers (down through meters, centimeters, millimeters for very close
/// objects) under a million km, AU out to 10 000 AU, then light-years. A
/// light-year figure in real use indicates some sort of error, but the
/// formatter handles it rather than corrupting the column; negative input
/// renders `<NEG!>`.
///
/// `au_only` forces the AU ladder regardless of magnitude (radar users
/// prefer no unit switching for close-approach objects).
pub fn format_distance(dist_in_au: f64, au_only: bool) -> String {
    let s = if dist_in_au < 0. {
        " <NEG!>".to_string()
    } else if au_only {
        show_dist_in_au(dist_in_au)
    } else {
        let dist_in_km = dist_in_au * AU;
        let s = if dist_in_km < 0.0099 {
            format!("{:5.0}mm", dist_in_km * 1e+6) // " NNNNmm"
        } else if dist_in_km < 0.099 {
            format!("{:5.0}cm", dist_in_km * 1e+5) // " NNNNcm"
        } else if dist_in_km < 99. {
            format!("{:6.0}m", dist_in_km * 1e+3) // " NNNNNm"
        } else if dist_in_km < 999. {
            format!("{dist_in_km:6.1}k") // " NNN.Nk"
        } else if dist_in_km < 999_999. {
            format!("{dist_in_km:7.0}")
        } else if dist_in_au > 9999.999 {
            show_dist_in_light_years(dist_in_au)
        } else {
            show_dist_in_au(dist_in_au)
        };
        strip_leading_zero(s)
    };
    debug_assert_eq!(s.len(), 7);
    s
}

/// Format a velocity in km/s into a seven-character field.
///
/// Fixed-point km/s out to a million km/s; beyond that, multiples of the
/// speed of light (never reached by real objects, kept for debugging), then
/// the `!!!!!!` saturation marker.
pub fn format_velocity(vel: f64) -> String {
    let s = if vel.abs() < 9.999 {
        format!("{vel:7.3}")
    } else if vel.abs() < 99.999 {
        format!("{vel:7.2}")
    } else if vel.abs() < 999.9 {
        format!("{vel:7.1}")
    } else if vel.abs() < 999_999. {
        format!("{vel:7.0}")
    } else {
        let in_c = vel / VLIGHT;
        if in_c.abs() < 99.999 {
            format!("{in_c:6.1}c")
        } else if in_c.abs() < 999_999. {
            format!("{in_c:6.0}c")
        } else {
            " !!!!!!".to_string()
        }
    };
    debug_assert_eq!(s.len(), 7);
    s
}

/// Format an on-sky motion rate (arcminutes/hour) into six characters.
pub fn format_motion(motion: f64) -> String {
    let s = if motion.abs() > 999_999. {
        "------".to_string()
    } else if motion.abs() > 999. {
        format!("{motion:6.0}")
    } else if motion.abs() > 99.9 {
        format!("{motion:6.1}")
    } else {
        format!("{motion:6.2}")
    };
    debug_assert_eq!(s.len(), 6);
    s
}

/// Pack a non-negative value into four characters with SI prefixes.
///
/// Used for the radar SNR column: `.53`-style under one, two decimals to
/// ten, one to a hundred, integers to 9999, then `5.2k`/` 83M`-style
/// prefixed values, then `!!!!`.
pub fn packed_si(ival: f64) -> String {
    let s = if ival > 999.0e+21 {
        "!!!!".to_string()
    } else if ival > 9999. {
        let mut v = ival;
        let mut out = String::new();
        let mut count = 0;
        while out.is_empty() {
            v /= 1000.;
            if v < 9.9 {
                out = format!("{:3.1}{}", v, SI_PREFIXES[count] as char);
            } else if v < 999. {
                out = format!("{:3}{}", v as u32, SI_PREFIXES[count] as char);
            }
            count += 1;
        }
        out
    } else if ival > 99.9 {
        format!("{:4}", (ival + 0.5) as u32)
    } else if ival > 9.9 {
        format!("{ival:4.1}")
    } else if ival > 0.99 {
        format!("{ival:4.2}")
    } else {
        // store without the leading zero
        format!("{ival:5.2}")[1..].to_string()
    };
    debug_assert_eq!(s.len(), 4);
    s
}

/// Precision selector for [`format_residual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidualPrecision {
    #[default]
    Standard,
    /// One extra digit in the one-to-ten arcsecond and sub-arcsecond bands.
    Precise,
    /// Additionally descend into SI-prefixed sub-milliarcsecond units.
    Overprecise,
}

impl ResidualPrecision {
    fn is_precise(self) -> bool {
        !matches!(self, ResidualPrecision::Standard)
    }
}

/// Express a residual (arcseconds, 0 to 180 degrees) as five characters
/// plus a trailing sign character: six bytes in all.
///
/// The ladder runs from ` Err!+` (over 999 degrees) through integer
/// degrees, arcminutes, arcseconds, down to fractional arcseconds; the
/// overprecise mode continues into `3.2u` (microarcseconds) and beyond.
/// A residual formatting to zero gets a blank sign.
pub fn format_residual(resid: f64, precision: ResidualPrecision) -> String {
    let zval = resid.abs();
    let precise = precision.is_precise();

    let mut text = if zval > 999. * 3600. {
        // >999 degrees: an error must have occurred upstream
        " Err!".to_string()
    } else if zval > 59_940. {
        format!("{:4.0}d", zval / 3600.)
    } else if zval > 9999.9 {
        format!("{:4.0}'", zval / 60.)
    } else if zval > 99.9 {
        format!("{zval:5.0}")
    } else if zval > 0.99 && zval < 9.99 && precise {
        format!("{zval:5.2}")
    } else if zval > 0.99 {
        format!("{zval:5.1}")
    } else if precision == ResidualPrecision::Overprecise && zval < 0.00999 {
        let lower_prefixes = b" munpfazy ";
        let mut v = zval;
        let mut i = 0;
        while v < 0.99 && i < 9 {
            v *= 1000.;
            i += 1;
        }
        if v < 9.9 {
            format!("{:4.1}{}", v, lower_prefixes[i] as char)
        } else {
            format!("{:4.0}{}", v, lower_prefixes[i] as char)
        }
    } else {
        let s = if precise {
            format!("{zval:5.3}")
        } else {
            format!("{zval:5.2}")
        };
        let mut b = s.into_bytes();
        b[if precise { 0 } else { 1 }] = b' ';
        String::from_utf8(b).expect("ascii formatting")
    };

    let formatted_value: f64 = text
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '\'')
        .trim()
        .parse()
        .unwrap_or(0.);
    if formatted_value == 0. {
        text.push(' ');
    } else if resid > 0. {
        text.push('+');
    } else {
        text.push('-');
    }
    debug_assert_eq!(text.len(), 6);
    text
}
