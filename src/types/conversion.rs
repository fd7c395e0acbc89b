//! Conversion of driver cells into application values.
//!
//! The conversion is driven by the column's driver type code: a cell that a
//! driver hands over as text for a DECIMAL column becomes a [`Decimal`], text
//! for a DATE column becomes days since the epoch, and so on. The parsing
//! helpers return `Result<T, String>` so the caller can attach the column
//! position and type code.

use crate::driver::Cell;
use crate::error::ConversionError;
use crate::types::{Decimal, SqlType, Value};

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_DAY: i64 = 86_400 * MICROS_PER_SECOND;

// Whole doubles in this half-open range convert to i64 exactly.
const I64_MIN_F64: f64 = -9_223_372_036_854_775_808.0;
const I64_MAX_F64: f64 = 9_223_372_036_854_775_808.0;

/// Years outside this range cannot produce an i32 day number.
const MAX_YEAR: i64 = 6_000_000;

/// Converts one cell of column `column` (0-based) using the column's type code.
///
/// Null cells always convert to [`Value::Null`]. Unknown vendor type codes
/// keep the cell's native shape.
///
/// # Errors
/// Returns `ConversionError::InvalidValue` if the cell cannot be read as the
/// column's type.
pub fn convert_cell(column: usize, sql_type: SqlType, cell: Cell) -> Result<Value, ConversionError> {
    let invalid = |message: String| ConversionError::InvalidValue {
        column,
        type_code: sql_type,
        message,
    };

    if matches!(cell, Cell::Null) || sql_type == SqlType::NULL {
        return Ok(Value::Null);
    }

    if sql_type.is_boolean() {
        return match cell {
            Cell::Bool(b) => Ok(Value::Boolean(b)),
            Cell::Int(i) => Ok(Value::Boolean(i != 0)),
            Cell::Text(s) => parse_boolean(&s).map(Value::Boolean).map_err(invalid),
            other => Err(invalid(format!("cannot read {} as boolean", other.kind()))),
        };
    }

    if sql_type.is_integer() {
        return match cell {
            Cell::Int(i) => Ok(Value::Integer(i)),
            Cell::Bool(b) => Ok(Value::Integer(i64::from(b))),
            Cell::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| invalid(format!("invalid integer: {s}"))),
            Cell::Double(d) if d.fract() == 0.0 && (I64_MIN_F64..I64_MAX_F64).contains(&d) => {
                Ok(Value::Integer(d as i64))
            }
            other => Err(invalid(format!("cannot read {} as integer", other.kind()))),
        };
    }

    if sql_type.is_floating() {
        return match cell {
            Cell::Double(d) => Ok(Value::Float(d)),
            Cell::Int(i) => Ok(Value::Float(i as f64)),
            Cell::Text(s) => parse_float(&s).map(Value::Float).map_err(invalid),
            other => Err(invalid(format!("cannot read {} as float", other.kind()))),
        };
    }

    if sql_type.is_decimal() {
        return match cell {
            Cell::Int(i) => Ok(Value::Decimal(Decimal::new(i128::from(i), 0))),
            Cell::Text(s) => parse_decimal(&s).map(Value::Decimal).map_err(invalid),
            Cell::Double(d) => parse_decimal(&d.to_string())
                .map(Value::Decimal)
                .map_err(invalid),
            other => Err(invalid(format!("cannot read {} as decimal", other.kind()))),
        };
    }

    if sql_type.is_binary() {
        return match cell {
            Cell::Bytes(b) => Ok(Value::Bytes(b)),
            Cell::Text(s) => Ok(Value::Bytes(decode_binary_text(&s).map_err(invalid)?)),
            other => Err(invalid(format!("cannot read {} as binary", other.kind()))),
        };
    }

    if sql_type == SqlType::DATE {
        return match cell {
            Cell::Int(days) => i32::try_from(days)
                .map(Value::Date)
                .map_err(|_| invalid(format!("day number out of range: {days}"))),
            Cell::Text(s) => parse_date_to_days(&s).map(Value::Date).map_err(invalid),
            other => Err(invalid(format!("cannot read {} as date", other.kind()))),
        };
    }

    if sql_type.is_time() {
        return match cell {
            Cell::Int(micros) => Ok(Value::Time(micros)),
            Cell::Text(s) => parse_time_to_micros(&s).map(Value::Time).map_err(invalid),
            other => Err(invalid(format!("cannot read {} as time", other.kind()))),
        };
    }

    if sql_type.is_timestamp() {
        return match cell {
            Cell::Int(micros) => Ok(Value::Timestamp(micros)),
            Cell::Text(s) => parse_timestamp_to_micros(&s)
                .map(Value::Timestamp)
                .map_err(invalid),
            other => Err(invalid(format!("cannot read {} as timestamp", other.kind()))),
        };
    }

    if sql_type.is_character() {
        return Ok(match cell {
            Cell::Text(s) => Value::Text(s),
            Cell::Bytes(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
            Cell::Bool(b) => Value::Text(b.to_string()),
            Cell::Int(i) => Value::Text(i.to_string()),
            Cell::Double(d) => Value::Text(d.to_string()),
            Cell::Null => Value::Null,
        });
    }

    Ok(native_value(cell))
}

/// Value for a cell whose type code carries no conversion rule.
fn native_value(cell: Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Boolean(b),
        Cell::Int(i) => Value::Integer(i),
        Cell::Double(d) => Value::Float(d),
        Cell::Text(s) => Value::Text(s),
        Cell::Bytes(b) => Value::Bytes(b),
    }
}

fn parse_boolean(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "y" | "yes" => Ok(true),
        "f" | "false" | "0" | "n" | "no" => Ok(false),
        _ => Err(format!("invalid boolean: {s}")),
    }
}

fn parse_float(s: &str) -> Result<f64, String> {
    match s.trim() {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        t => t.parse::<f64>().map_err(|_| format!("invalid float: {s}")),
    }
}

/// Decodes a textual binary payload. PostgreSQL hex output (`\x0aff`) is
/// decoded; any other text is taken as its UTF-8 bytes.
fn decode_binary_text(s: &str) -> Result<Vec<u8>, String> {
    let Some(hex) = s.strip_prefix("\\x") else {
        return Ok(s.as_bytes().to_vec());
    };
    if hex.len() % 2 != 0 {
        return Err(format!("odd-length hex payload: {s}"));
    }
    hex.as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(n, pair)| match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(format!("invalid hex digits at offset {}: {s}", n * 2)),
        })
        .collect()
}

fn hex_digit(byte: u8) -> Option<u8> {
    char::from(byte).to_digit(16).and_then(|d| u8::try_from(d).ok())
}

/// Parses a decimal string, taking the scale from the digits after the point.
///
/// # Example
/// ```ignore
/// assert_eq!(parse_decimal("-12.50")?, Decimal::new(-1250, 2));
/// ```
pub fn parse_decimal(value_str: &str) -> Result<Decimal, String> {
    let trimmed = value_str.trim();
    let scale = match trimmed.split_once('.') {
        Some((_, frac)) => frac.len(),
        None => 0,
    };
    let scale = i8::try_from(scale).map_err(|_| format!("Scale too large: {value_str}"))?;
    Ok(Decimal::new(parse_decimal_to_i128(trimmed, scale)?, scale))
}

/// Parses a decimal string to i128 with the given scale.
///
/// Supports formats:
/// - "123" (integer)
/// - "123.45" (decimal)
/// - "-123.45" (negative decimal)
///
/// Fractional digits beyond `scale` are truncated.
pub fn parse_decimal_to_i128(value_str: &str, scale: i8) -> Result<i128, String> {
    if scale < 0 {
        return Err(format!("Negative scale {scale} for value: {value_str}"));
    }
    let (integer_part, decimal_part) = match value_str.split_once('.') {
        Some((_, frac)) if frac.contains('.') => {
            return Err(format!("Invalid decimal format: {value_str}"))
        }
        Some((int, frac)) => (int, frac),
        None => (value_str, ""),
    };
    let negative = integer_part.starts_with('-');
    let digits = integer_part.trim_start_matches(['-', '+']);
    if !decimal_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid decimal part: {decimal_part}"));
    }

    let overflow = || format!("Numeric overflow for value: {value_str}");
    let magnitude: i128 = if digits.is_empty() {
        0
    } else {
        digits
            .parse()
            .map_err(|_| format!("Invalid integer part: {integer_part}"))?
    };
    let factor = 10_i128.checked_pow(scale as u32).ok_or_else(overflow)?;
    let mut result = magnitude.checked_mul(factor).ok_or_else(overflow)?;

    let kept = decimal_part.len().min(scale as usize);
    if kept > 0 {
        let fraction: i128 = decimal_part[..kept]
            .parse()
            .map_err(|_| format!("Invalid decimal part: {decimal_part}"))?;
        let padded = 10_i128
            .checked_pow((scale as usize - kept) as u32)
            .and_then(|f| fraction.checked_mul(f))
            .ok_or_else(overflow)?;
        result = result.checked_add(padded).ok_or_else(overflow)?;
    }

    Ok(if negative { -result } else { result })
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = i64::from(month);
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Parses a date string (YYYY-MM-DD) to days since Unix epoch (1970-01-01).
pub fn parse_date_to_days(date_str: &str) -> Result<i32, String> {
    let trimmed = date_str.trim();
    let (negative_year, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let parts: Vec<&str> = body.split('-').collect();
    if parts.len() != 3 {
        return Err(format!("Invalid date format: {date_str} (expected YYYY-MM-DD)"));
    }

    let mut year: i64 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid year: {}", parts[0]))?;
    if negative_year {
        year = -year;
    }
    let month: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid month: {}", parts[1]))?;
    let day: u32 = parts[2]
        .parse()
        .map_err(|_| format!("Invalid day: {}", parts[2]))?;

    if !(-MAX_YEAR..=MAX_YEAR).contains(&year) {
        return Err(format!("Year out of range: {year}"));
    }
    if !(1..=12).contains(&month) {
        return Err(format!("Month out of range: {month}"));
    }
    if !(1..=31).contains(&day) {
        return Err(format!("Day out of range: {day}"));
    }

    i32::try_from(days_from_civil(year, month, day))
        .map_err(|_| format!("Date out of range: {date_str}"))
}

/// Parses `HH:MM[:SS[.ffffff]]` to microseconds since midnight.
pub fn parse_time_to_micros(time_str: &str) -> Result<i64, String> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(format!("Invalid time format: {time_str}"));
    }
    let hours: i64 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid hour: {}", parts[0]))?;
    let minutes: i64 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid minute: {}", parts[1]))?;
    let overflow = || format!("Time out of range: {time_str}");
    let mut micros = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|s| s.checked_mul(MICROS_PER_SECOND))
        .ok_or_else(overflow)?;

    if let Some(seconds_part) = parts.get(2) {
        let (whole, frac) = seconds_part.split_once('.').unwrap_or((seconds_part, ""));
        let seconds: i64 = whole
            .parse()
            .map_err(|_| format!("Invalid second: {whole}"))?;
        micros = seconds
            .checked_mul(MICROS_PER_SECOND)
            .and_then(|s| micros.checked_add(s))
            .ok_or_else(overflow)?;
        if !frac.is_empty() {
            let digits: String = frac.chars().take(6).collect();
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("Invalid fractional second: {frac}"));
            }
            let value: i64 = digits
                .parse()
                .map_err(|_| format!("Invalid fractional second: {frac}"))?;
            micros = micros
                .checked_add(value * 10_i64.pow(6 - digits.len() as u32))
                .ok_or_else(overflow)?;
        }
    }

    Ok(micros)
}

/// Splits a trailing UTC offset (`Z`, `+HH`, `+HH:MM`, `-HHMM`) off a time string.
fn split_offset(time: &str) -> Result<(&str, i64), String> {
    if let Some(rest) = time.strip_suffix('Z') {
        return Ok((rest, 0));
    }
    let Some(idx) = time.rfind(['+', '-']) else {
        return Ok((time, 0));
    };
    let (clock, offset) = time.split_at(idx);
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let digits: String = offset[1..].chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("Invalid UTC offset: {offset}"));
    }
    let (hh, mm) = match digits.len() {
        2 => (&digits[..2], "0"),
        4 => (&digits[..2], &digits[2..]),
        _ => return Err(format!("Invalid UTC offset: {offset}")),
    };
    let hours: i64 = hh.parse().map_err(|_| format!("Invalid UTC offset: {offset}"))?;
    let minutes: i64 = mm.parse().map_err(|_| format!("Invalid UTC offset: {offset}"))?;
    Ok((clock, sign * (hours * 3600 + minutes * 60) * MICROS_PER_SECOND))
}

/// Parses a timestamp string to microseconds since Unix epoch.
///
/// Supports formats:
/// - "YYYY-MM-DD" (date only, time defaults to 00:00:00)
/// - "YYYY-MM-DD HH:MM:SS" or with a `T` separator
/// - "YYYY-MM-DD HH:MM:SS.ffffff"
/// - any of the above with a trailing UTC offset, which is normalized to UTC
pub fn parse_timestamp_to_micros(timestamp_str: &str) -> Result<i64, String> {
    let trimmed = timestamp_str.trim();
    let (date_part, time_part) = match trimmed.split_once([' ', 'T']) {
        Some((date, time)) => (date, Some(time.trim())),
        None => (trimmed, None),
    };

    let overflow = || format!("Timestamp out of range: {timestamp_str}");
    let days = parse_date_to_days(date_part)?;
    let mut micros = i64::from(days)
        .checked_mul(MICROS_PER_DAY)
        .ok_or_else(overflow)?;

    if let Some(time) = time_part {
        let (clock, offset) = split_offset(time)?;
        micros = micros
            .checked_add(parse_time_to_micros(clock)?)
            .and_then(|m| m.checked_sub(offset))
            .ok_or_else(overflow)?;
    }

    Ok(micros)
}
