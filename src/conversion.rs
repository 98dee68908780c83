//! # Sexagesimal and decimal angle rendering
//!
//! Renders right ascensions (in hours) and declinations (in degrees) into a
//! twelve-character column using a precision selector decoded from the
//! integer codes carried by astrometric records. The integer part and the
//! fraction are split with `i64` arithmetic after a single half-ulp nudge,
//! so a value that rounds up propagates its carry through seconds, minutes
//! and hours consistently instead of printing `59.60`.

/// Width of every rendered angle field.
pub const ANGLE_FIELD_WIDTH: usize = 12;

/// Decoded angle-precision selector.
///
/// The raw integer codes come from astrometric data formats:
/// `100..=109` decimal hours/degrees (`dd.dd…`), `201..=208` decimal
/// degrees with a three-digit integer part (`ddd.dd…`, the value is
/// multiplied by 15 for hours-to-degrees), `-1..=-7` hours and decimal
/// minutes (`hh mm.mmm…`), `0..=3` full sexagesimal (`hh mm ss.sss`), and
/// `307..=312` the same digits packed without separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnglePrecision {
    /// `dd.dd…` (or `ddd.dd…` with the ×15 hours-to-degrees conversion).
    Decimal { three_digit: bool, digits: u32 },
    /// `hh mm.mmm…`
    Minutes { digits: u32 },
    /// `hh mm ss.sss…`, optionally packed without separators.
    Seconds { digits: u32, packed: bool },
}

impl AnglePrecision {
    /// Decode a raw precision code; `None` for codes with no defined layout.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            100..=109 => Some(Self::Decimal {
                three_digit: false,
                digits: (code - 100) as u32,
            }),
            // 200 keeps the two-digit layout with no fraction
            200 => Some(Self::Decimal {
                three_digit: false,
                digits: 0,
            }),
            201..=208 => Some(Self::Decimal {
                three_digit: true,
                digits: (code - 200) as u32,
            }),
            -7..=-1 => Some(Self::Minutes {
                digits: (-1 - code) as u32,
            }),
            0..=3 => Some(Self::Seconds {
                digits: code as u32,
                packed: false,
            }),
            307..=312 => Some(Self::Seconds {
                digits: (code - 306) as u32,
                packed: true,
            }),
            _ => None,
        }
    }
}

fn ten_to_the_nth(n: u32) -> i64 {
    10_i64.pow(n)
}

fn pad_to_width(mut s: String) -> String {
    while s.len() < ANGLE_FIELD_WIDTH {
        s.push(' ');
    }
    debug_assert_eq!(s.len(), ANGLE_FIELD_WIDTH);
    s
}

/// Render `angle` (hours for RA-like quantities, degrees for declinations)
/// as a twelve-character left-aligned field.
pub fn output_angle(angle: f64, precision: AnglePrecision) -> String {
    let mut out;
    let (digits, fraction, separator) = match precision {
        AnglePrecision::Decimal {
            three_digit,
            digits,
        } => {
            let power = ten_to_the_nth(digits);
            let mult = if three_digit { 15. } else { 1. };
            let mut fraction = (angle * mult * power as f64 + 0.5) as i64;
            out = if three_digit {
                format!("{:03}", fraction / power)
            } else {
                format!("{:02}", fraction / power)
            };
            fraction %= power;
            (digits, fraction, true)
        }
        AnglePrecision::Minutes { digits } => {
            let power = ten_to_the_nth(digits);
            let mut fraction = (angle * 60. * power as f64 + 0.5) as i64;
            out = format!(
                "{:02} {:02}",
                fraction / (60 * power),
                (fraction / power) % 60
            );
            fraction %= power;
            (digits, fraction, true)
        }
        AnglePrecision::Seconds { digits, packed } => {
            let power = ten_to_the_nth(digits);
            let mut fraction = (angle * 3600. * power as f64 + 0.5) as i64;
            let hours = fraction / (3600 * power);
            let minutes = (fraction / (60 * power)) % 60;
            let seconds = (fraction / power) % 60;
            out = if packed {
                format!("{hours:02}{minutes:02}{seconds:02}")
            } else {
                format!("{hours:02} {minutes:02} {seconds:02}")
            };
            fraction %= power;
            // super-precise packed formats omit the decimal point too
            (digits, fraction, !packed)
        }
    };
    if digits > 0 {
        if separator {
            out.push('.');
        }
        out.push_str(&format!("{:0width$}", fraction, width = digits as usize));
    }
    pad_to_width(out)
}

/// Render an angle from a raw precision code, falling back to a `?`-marked
/// decimal dump for codes with no defined layout.
pub fn output_angle_from_code(angle: f64, code: i32) -> String {
    match AnglePrecision::from_code(code) {
        Some(precision) => output_angle(angle, precision),
        None => {
            let s = if angle > -1000. && angle < 1000. {
                format!("?{angle:.5}")
            } else {
                "?".to_string()
            };
            pad_to_width(s)
        }
    }
}

/// Render a declination (radians) as sign plus an eleven-character
/// sexagesimal field: `±dd mm ss.ss`-style, twelve characters in all.
pub fn format_signed_dec(dec: f64, precision: AnglePrecision) -> String {
    let sign = if dec < 0. { '-' } else { '+' };
    let body = output_angle(dec.abs().to_degrees(), precision);
    let mut s = String::with_capacity(ANGLE_FIELD_WIDTH);
    s.push(sign);
    s.push_str(&body[..ANGLE_FIELD_WIDTH - 1]);
    debug_assert_eq!(s.len(), ANGLE_FIELD_WIDTH);
    s
}

/// Render a right ascension (radians) as an `hh mm ss…` field.
pub fn format_ra(ra: f64, precision: AnglePrecision) -> String {
    output_angle(ra.to_degrees() / 15., precision)
}
