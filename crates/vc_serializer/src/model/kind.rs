use alloc::format;
use alloc::string::{String, ToString};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::native::{Decimal, Scalar};

// -----------------------------------------------------------------------------
// ScalarKind

/// The storage type of a model field.
///
/// Drives coercion when rebuilding a model from a native tree,
/// and the internal type name some renderers print next to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Decimal,
    Str,
    Date,
    Time,
    DateTime,
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl ScalarKind {
    /// The field type name, as printed by attribute-aware renderers.
    pub const fn internal_type(self) -> &'static str {
        match self {
            Self::Bool => "BooleanField",
            Self::Int => "IntegerField",
            Self::Float => "FloatField",
            Self::Decimal => "DecimalField",
            Self::Str => "CharField",
            Self::Date => "DateField",
            Self::Time => "TimeField",
            Self::DateTime => "DateTimeField",
        }
    }

    /// Coerces a scalar into this kind.
    ///
    /// `Null` always passes through. Strings are parsed in the forms the
    /// renderers write them.
    pub fn coerce(self, value: &Scalar) -> Result<Scalar, String> {
        if value.is_null() {
            return Ok(Scalar::Null);
        }
        let rejected = || format!("`{value}` is not a valid {}", self.describe());
        match (self, value) {
            (Self::Bool, Scalar::Bool(_))
            | (Self::Int, Scalar::Int(_))
            | (Self::Float, Scalar::Float(_))
            | (Self::Decimal, Scalar::Decimal(_))
            | (Self::Str, Scalar::Str(_))
            | (Self::Date, Scalar::Date(_))
            | (Self::Time, Scalar::Time(_))
            | (Self::DateTime, Scalar::DateTime(_)) => Ok(value.clone()),

            (Self::Bool, Scalar::Int(0)) => Ok(Scalar::Bool(false)),
            (Self::Bool, Scalar::Int(1)) => Ok(Scalar::Bool(true)),
            (Self::Bool, Scalar::Str(s)) => match s.as_str() {
                "true" | "True" | "1" => Ok(Scalar::Bool(true)),
                "false" | "False" | "0" => Ok(Scalar::Bool(false)),
                _ => Err(rejected()),
            },

            (Self::Int, Scalar::Str(s)) => s.trim().parse().map(Scalar::Int).map_err(|_| rejected()),
            (Self::Int, Scalar::Float(f)) if (*f as i64) as f64 == *f => Ok(Scalar::Int(*f as i64)),

            (Self::Float, Scalar::Int(i)) => Ok(Scalar::Float(*i as f64)),
            (Self::Float, Scalar::Str(s)) => s.trim().parse().map(Scalar::Float).map_err(|_| rejected()),

            (Self::Decimal, Scalar::Int(i)) => Ok(Scalar::Decimal(Decimal::from(*i))),
            (Self::Decimal, Scalar::Float(f)) => {
                f.to_string().parse().map(Scalar::Decimal).map_err(|_| rejected())
            }
            (Self::Decimal, Scalar::Str(s)) => s.trim().parse().map(Scalar::Decimal).map_err(|_| rejected()),

            (Self::Str, other) => Ok(Scalar::Str(other.to_string())),

            (Self::Date, Scalar::DateTime(dt)) => Ok(Scalar::Date(dt.date())),
            (Self::Date, Scalar::Str(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                .map(Scalar::Date)
                .map_err(|_| rejected()),

            (Self::Time, Scalar::Str(s)) => TIME_FORMATS
                .iter()
                .find_map(|f| NaiveTime::parse_from_str(s.trim(), f).ok())
                .map(Scalar::Time)
                .ok_or_else(rejected),

            (Self::DateTime, Scalar::Date(d)) => Ok(Scalar::DateTime(d.and_time(NaiveTime::MIN))),
            (Self::DateTime, Scalar::Str(s)) => {
                let s = s.trim();
                DATETIME_FORMATS
                    .iter()
                    .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                    .or_else(|| {
                        NaiveDate::parse_from_str(s, DATE_FORMAT)
                            .ok()
                            .map(|d| d.and_time(NaiveTime::MIN))
                    })
                    .map(Scalar::DateTime)
                    .ok_or_else(rejected)
            }

            _ => Err(rejected()),
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Str => "string",
            Self::Date => "date (YYYY-MM-DD)",
            Self::Time => "time (HH:MM[:ss[.uuuuuu]])",
            Self::DateTime => "datetime (YYYY-MM-DD HH:MM[:ss[.uuuuuu]])",
        }
    }
}
