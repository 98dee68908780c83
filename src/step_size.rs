//! # Step-size mini-language
//!
//! Parses ephemeris step sizes such as `1`, `0.25d`, `3h`, `20m`, `30s`,
//! `2w` or `.5y` into a step in days. The number of digits after the
//! decimal point is captured from the literal text, so the date column of
//! an ephemeris stepped at `0.001d` can be printed to exactly the precision
//! the step deserves.

use nom::{
    character::complete::{char, digit0, one_of},
    combinator::{opt, recognize},
    sequence::{pair, tuple},
    IResult,
};

use crate::constants::{HOURS_PER_DAY, MINUTES_PER_DAY, SECONDS_PER_DAY};
use crate::ephemerix_errors::EphemerixError;

/// Unit suffix of a step-size literal. Bare numbers default to days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepUnit {
    #[default]
    Days,
    Hours,
    Minutes,
    Seconds,
    Weeks,
    Years,
}

impl StepUnit {
    /// Canonical lowercase suffix character.
    pub fn as_char(self) -> char {
        match self {
            StepUnit::Days => 'd',
            StepUnit::Hours => 'h',
            StepUnit::Minutes => 'm',
            StepUnit::Seconds => 's',
            StepUnit::Weeks => 'w',
            StepUnit::Years => 'y',
        }
    }

    fn from_suffix(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'd' => Some(StepUnit::Days),
            'h' => Some(StepUnit::Hours),
            'm' => Some(StepUnit::Minutes),
            's' => Some(StepUnit::Seconds),
            'w' => Some(StepUnit::Weeks),
            'y' => Some(StepUnit::Years),
            _ => None,
        }
    }

    /// Days per one of this unit (a year is the Julian 365.25 days).
    pub fn days_per_unit(self) -> f64 {
        match self {
            StepUnit::Days => 1.,
            StepUnit::Hours => 1. / HOURS_PER_DAY,
            StepUnit::Minutes => 1. / MINUTES_PER_DAY,
            StepUnit::Seconds => 1. / SECONDS_PER_DAY,
            StepUnit::Weeks => 7.,
            StepUnit::Years => 365.25,
        }
    }
}

/// A parsed ephemeris step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSize {
    /// Step in days; negative for backward ephemerides.
    pub days: f64,
    /// Unit the user wrote the step in.
    pub unit: StepUnit,
    /// Count of digits after the decimal point in the literal, used to set
    /// the precision of the output date column.
    pub digits: usize,
}

fn step_literal(input: &str) -> IResult<&str, (&str, Option<char>)> {
    tuple((
        recognize(tuple((
            opt(one_of("+-")),
            digit0,
            opt(pair(char('.'), digit0)),
        ))),
        opt(one_of("dDhHmMsSwWyY")),
    ))(input)
}

/// Parse a step-size literal into days.
///
/// A zero step can never advance an ephemeris and is rejected, as is a
/// trailing unit the mini-language does not define.
pub fn parse_step_size(text: &str) -> Result<StepSize, EphemerixError> {
    let trimmed = text.trim();
    let invalid = || EphemerixError::InvalidStepSize(text.to_string());

    let (rest, (number, suffix)) = step_literal(trimmed).map_err(|_| invalid())?;
    if !rest.is_empty() || number.is_empty() {
        return Err(invalid());
    }
    let value: f64 = number.parse().map_err(|_| invalid())?;
    if value == 0. {
        return Err(invalid());
    }
    let unit = match suffix {
        // the one_of above only admits defined suffixes
        Some(c) => StepUnit::from_suffix(c).ok_or_else(invalid)?,
        None => StepUnit::Days,
    };
    let digits = number
        .split_once('.')
        .map_or(0, |(_, frac)| frac.chars().take_while(char::is_ascii_digit).count());

    Ok(StepSize {
        days: value * unit.days_per_unit(),
        unit,
        digits,
    })
}

#[cfg(test)]
mod step_size_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plain_days() {
        let s = parse_step_size("1").unwrap();
        assert_eq!(s.days, 1.0);
        assert_eq!(s.unit, StepUnit::Days);
        assert_eq!(s.digits, 0);
    }

    #[test]
    fn test_fractional_digits_captured() {
        let s = parse_step_size("0.001d").unwrap();
        assert_eq!(s.days, 0.001);
        assert_eq!(s.digits, 3);

        let s = parse_step_size(".25").unwrap();
        assert_eq!(s.days, 0.25);
        assert_eq!(s.digits, 2);
    }

    #[test]
    fn test_unit_suffixes() {
        assert_relative_eq!(parse_step_size("3h").unwrap().days, 0.125);
        assert_relative_eq!(parse_step_size("30M").unwrap().days, 30. / 1440.);
        assert_relative_eq!(parse_step_size("10s").unwrap().days, 10. / 86400.);
        assert_relative_eq!(parse_step_size("2w").unwrap().days, 14.);
        assert_relative_eq!(parse_step_size("1y").unwrap().days, 365.25);
        assert_eq!(parse_step_size("1y").unwrap().unit, StepUnit::Years);
    }

    #[test]
    fn test_negative_step() {
        let s = parse_step_size("-2h").unwrap();
        assert_relative_eq!(s.days, -2. / 24.);
    }

    #[test]
    fn test_rejects_zero_and_garbage() {
        assert!(parse_step_size("0").is_err());
        assert!(parse_step_size("0.0d").is_err());
        assert!(parse_step_size("").is_err());
        assert!(parse_step_size("5x").is_err());
        assert!(parse_step_size("1.5d extra").is_err());
    }
}
