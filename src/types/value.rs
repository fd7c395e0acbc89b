//! Application-level values produced by materialization.

use std::fmt;

/// A fixed-point decimal: `unscaled * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub unscaled: i128,
    pub scale: i8,
}

impl Decimal {
    #[must_use]
    pub const fn new(unscaled: i128, scale: i8) -> Self {
        Self { unscaled, scale }
    }

    /// Re-express this decimal at a larger scale.
    ///
    /// Returns `None` on overflow or when `scale` is smaller than the
    /// current scale.
    #[must_use]
    pub fn rescale(self, scale: i8) -> Option<i128> {
        if scale < self.scale {
            return None;
        }
        let factor = 10_i128.checked_pow((scale - self.scale) as u32)?;
        self.unscaled.checked_mul(factor)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            let exponent = self.scale.unsigned_abs();
            return match 10_i128
                .checked_pow(u32::from(exponent))
                .and_then(|factor| self.unscaled.checked_mul(factor))
            {
                Some(value) => write!(f, "{value}"),
                None => write!(f, "{}e{exponent}", self.unscaled),
            };
        }
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.unscaled < 0 { "-" } else { "" };
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            write!(f, "{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

/// Marker wrapper for binary column payloads.
///
/// Typed results wrap non-null values of binary-kind columns in this type so
/// the consumer can tell raw bytes apart from text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryData(Vec<u8>);

impl BinaryData {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Wrap a converted value. Null stays null, bytes and text become
    /// [`Value::Binary`], anything else is returned unchanged.
    #[must_use]
    pub fn wrap(value: Value) -> Value {
        match value {
            Value::Bytes(bytes) => Value::Binary(BinaryData(bytes)),
            Value::Text(text) => Value::Binary(BinaryData(text.into_bytes())),
            other => other,
        }
    }
}

/// One converted cell of a row tuple.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    /// Binary payload marked for the consumer.
    Binary(BinaryData),
    /// Days since 1970-01-01.
    Date(i32),
    /// Microseconds since midnight.
    Time(i64),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Binary(b) => Some(b.as_bytes()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Binary(b) => write!(f, "<binary {} bytes>", b.as_bytes().len()),
            Value::Date(days) => write!(f, "date({days})"),
            Value::Time(micros) => write!(f, "time({micros})"),
            Value::Timestamp(micros) => write!(f, "timestamp({micros})"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
