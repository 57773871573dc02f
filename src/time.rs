//! Instant layouts, epoch interpretation and the duration literal grammar.

use std::fmt::Write as _;

use chrono::format::{ParseError, ParseErrorKind};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Deserialize;
use thiserror::Error;

use crate::options::EpochUnit;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// One accepted textual instant layout.
///
/// `Format` takes a chrono `strftime` pattern. Patterns without an offset
/// are read in the configured default offset, date-only patterns at
/// midnight.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeLayout {
    Rfc3339,
    Rfc2822,
    Format(String),
}

/// Built-in layouts, most specific first.
pub fn default_layouts() -> Vec<TimeLayout> {
    let formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%.f %z",
        "%Y-%m-%d %H:%M:%S%.f %:z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f",
        "%a %b %e %H:%M:%S %Y",
        "%d %b %Y",
        "%Y-%m-%d",
    ];
    let mut layouts = vec![TimeLayout::Rfc3339, TimeLayout::Rfc2822];
    layouts.extend(formats.iter().map(|f| TimeLayout::Format((*f).to_string())));
    layouts
}

impl TimeLayout {
    fn parse(&self, text: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>, InstantError> {
        match self {
            TimeLayout::Rfc3339 => Ok(DateTime::parse_from_rfc3339(text)?),
            TimeLayout::Rfc2822 => Ok(DateTime::parse_from_rfc2822(text)?),
            TimeLayout::Format(format) => parse_format(text, format, offset),
        }
    }
}

/// Rejection of an instant string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstantError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("instant out of range")]
    OutOfRange,
    #[error("no time layouts configured")]
    NoLayouts,
}

// Zoned first, then naive date-time, then bare date. Only a pattern that
// lacks fields falls through to the next reading.
fn parse_format(
    text: &str,
    format: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, InstantError> {
    match DateTime::parse_from_str(text, format) {
        Err(e) if e.kind() == ParseErrorKind::NotEnough => {}
        zoned => return Ok(zoned?),
    }
    let naive = match NaiveDateTime::parse_from_str(text, format) {
        Ok(naive) => naive,
        Err(e) if e.kind() == ParseErrorKind::NotEnough => {
            NaiveDate::parse_from_str(text, format)?.and_time(NaiveTime::default())
        }
        Err(e) => return Err(e.into()),
    };
    naive
        .and_local_timezone(offset)
        .single()
        .ok_or(InstantError::OutOfRange)
}

/// Parses `text` against `layouts` in order; first match wins.
///
/// On failure the error of the last layout tried is returned.
pub(crate) fn parse_instant(
    text: &str,
    layouts: &[TimeLayout],
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, InstantError> {
    let mut last = InstantError::NoLayouts;
    for layout in layouts {
        match layout.parse(text, offset) {
            Ok(instant) => return Ok(instant),
            Err(e) => last = e,
        }
    }
    Err(last)
}

/// Instant `count` units after the Unix epoch, in `offset`.
pub(crate) fn from_epoch(
    count: i64,
    unit: EpochUnit,
    offset: FixedOffset,
) -> Option<DateTime<FixedOffset>> {
    let nanos = i128::from(count) * unit.nanos();
    let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).ok()?;
    let subsec = u32::try_from(nanos.rem_euclid(NANOS_PER_SEC)).ok()?;
    DateTime::from_timestamp(secs, subsec).map(|utc| utc.with_timezone(&offset))
}

/// Total nanoseconds of a duration.
pub(crate) fn total_nanos(duration: &TimeDelta) -> i128 {
    i128::from(duration.num_seconds()) * NANOS_PER_SEC + i128::from(duration.subsec_nanos())
}

/// Rejection of a duration literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),
    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),
    #[error("unknown unit {unit:?} in duration {text:?}")]
    UnknownUnit { unit: String, text: String },
    #[error("duration {0:?} out of range")]
    OutOfRange(String),
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 3_600 * 1_000_000_000,
        _ => return None,
    })
}

// Fraction digits past this cannot change a nanosecond count, even in hours.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses a duration literal such as `"1h30m"`, `"-1.5s"` or `"300ms"`.
///
/// The grammar is a sign followed by one or more decimal numbers, each with
/// a unit out of `ns`, `us` (`µs`), `ms`, `s`, `m`, `h`. A lone `"0"` needs
/// no unit. The result must fit in `i64` nanoseconds.
pub fn parse_duration(text: &str) -> Result<TimeDelta, DurationError> {
    let invalid = || DurationError::Invalid(text.to_string());
    let out_of_range = || DurationError::OutOfRange(text.to_string());

    let mut rest = text;
    let negative = rest.starts_with('-');
    if let Some(stripped) = rest.strip_prefix(['-', '+']) {
        rest = stripped;
    }
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        if !rest.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let (int_digits, after) = rest.split_at(int_len);
        rest = after;
        let whole: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| out_of_range())?
        };

        let mut fraction: u128 = 0;
        let mut scale: u128 = 1;
        let mut has_fraction = false;
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            let (frac_digits, after) = after_dot.split_at(frac_len);
            rest = after;
            has_fraction = !frac_digits.is_empty();
            for digit in frac_digits.bytes().take(MAX_FRACTION_DIGITS) {
                fraction = fraction * 10 + u128::from(digit - b'0');
                scale *= 10;
            }
        }
        if int_digits.is_empty() && !has_fraction {
            return Err(invalid());
        }

        let unit_len = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (unit, after) = rest.split_at(unit_len);
        rest = after;
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(text.to_string()));
        }
        let per_unit = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            text: text.to_string(),
        })?;

        let amount = whole
            .checked_mul(per_unit)
            .and_then(|n| n.checked_add(fraction * per_unit / scale))
            .ok_or_else(out_of_range)?;
        total = total.checked_add(amount).ok_or_else(out_of_range)?;
    }

    let signed = i128::try_from(total).map_err(|_| out_of_range())?;
    let signed = if negative { -signed } else { signed };
    let nanos = i64::try_from(signed).map_err(|_| out_of_range())?;
    Ok(TimeDelta::nanoseconds(nanos))
}

/// Formats a duration as `72h3m0.5s`, `1.5ms` or `0s`.
///
/// The output is accepted by [`parse_duration`].
pub fn format_duration(duration: &TimeDelta) -> String {
    let nanos = total_nanos(duration);
    if nanos == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
    }
    let magnitude = nanos.unsigned_abs();

    if magnitude < NANOS_PER_SEC as u128 {
        let (scale, unit) = match magnitude {
            0..1_000 => (1, "ns"),
            1_000..1_000_000 => (1_000, "µs"),
            _ => (1_000_000, "ms"),
        };
        write_decimal(&mut out, magnitude, scale);
        out.push_str(unit);
        return out;
    }

    let secs = magnitude / NANOS_PER_SEC as u128;
    let hours = secs / 3_600;
    let minutes = secs / 60 % 60;
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    write_decimal(&mut out, magnitude % (60 * NANOS_PER_SEC as u128), NANOS_PER_SEC as u128);
    out.push('s');
    out
}

// Writes `value / scale` with the fraction's trailing zeros trimmed.
fn write_decimal(out: &mut String, value: u128, scale: u128) {
    let _ = write!(out, "{}", value / scale);
    let fraction = value % scale;
    if fraction == 0 {
        return;
    }
    let width = scale.ilog10() as usize;
    let digits = format!("{fraction:0width$}");
    out.push('.');
    out.push_str(digits.trim_end_matches('0'));
}
