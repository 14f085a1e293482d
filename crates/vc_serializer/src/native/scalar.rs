use alloc::string::{String, ToString};
use core::fmt;
use core::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

// -----------------------------------------------------------------------------
// Decimal

/// A fixed-point decimal kept in its canonical textual form.
///
/// Renderers emit it as a string, so no precision is lost on the way through
/// a format that only knows binary floats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal(String);

/// The text is not a decimal literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDecimalError;

impl fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid decimal literal")
    }
}

impl Decimal {
    /// Returns the canonical text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Accepts `[+-]digits[.digits]`, with at least one digit overall.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix(['+', '-']).unwrap_or(s);
        let (int, frac) = match body.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (body, ""),
        };
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int.is_empty() && frac.is_empty()) || !digits(int) || !digits(frac) {
            return Err(ParseDecimalError);
        }
        let text = s.strip_prefix('+').unwrap_or(s);
        Ok(Self(text.to_string()))
    }
}

impl From<i64> for Decimal {
    #[inline]
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for Decimal {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// -----------------------------------------------------------------------------
// Scalar

/// A protected value: passed through serialization unchanged.
///
/// Strings are scalars, never sequences of characters.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Scalar {
    /// A short name of the variant, used in error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Str(_) => "string",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
        }
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// The string conversion used for attribute values and text nodes.
///
/// Date-times use the ISO `T` separator; `Null` renders as `None`.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("None"),
            Self::Bool(b) => {
                if *b {
                    f.write_str("True")
                } else {
                    f.write_str("False")
                }
            }
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(d) => f.write_str(d.as_str()),
            Self::Str(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::DateTime(dt) => write!(f, "{}T{}", dt.date(), dt.time()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value $(as $cast)?)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    u8 => Int as i64,
    u16 => Int as i64,
    u32 => Int as i64,
    f32 => Float as f64,
    f64 => Float,
    Decimal => Decimal,
    String => Str,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
}

impl From<&str> for Scalar {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    #[inline]
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Decimal, Scalar};
    use alloc::string::ToString;
    use chrono::NaiveDate;

    #[test]
    fn decimal_literals() {
        assert_eq!("12.50".parse::<Decimal>().unwrap().as_str(), "12.50");
        assert_eq!("+3".parse::<Decimal>().unwrap().as_str(), "3");
        assert_eq!("-.5".parse::<Decimal>().unwrap().as_str(), "-.5");
        assert!("".parse::<Decimal>().is_err());
        assert!(".".parse::<Decimal>().is_err());
        assert!("1e5".parse::<Decimal>().is_err());
    }

    #[test]
    fn display_forms() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dt = date.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(Scalar::Date(date).to_string(), "2020-01-01");
        assert_eq!(Scalar::DateTime(dt).to_string(), "2020-01-01T08:30:00");
        assert_eq!(Scalar::Bool(true).to_string(), "True");
        assert_eq!(Scalar::Null.to_string(), "None");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(Scalar::from(None::<i32>), Scalar::Null);
        assert_eq!(Scalar::from(Some("x")), Scalar::Str("x".to_string()));
    }
}
