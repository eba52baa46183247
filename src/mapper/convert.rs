//! Typed conversions from raw cell values.
//!
//! Each field type picks its conversion through [`FromCell`] when the column
//! is mapped, so reading a cell never dispatches on runtime type information.
//! Text is parsed the same way regardless of locale: `.` is the only
//! decimal separator and dates use ISO 8601 layouts.
use crate::spreadsheet::Value;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Failure to convert one raw cell value into a field type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Cannot convert an empty cell to {target}")]
    Empty { target: &'static str },

    #[error("Cannot parse '{value}' as {target}")]
    Format { value: String, target: &'static str },

    #[error("Value {value} is out of range for {target}")]
    Overflow { value: String, target: &'static str },

    #[error("Cannot convert {kind} value to {target}")]
    Cast { kind: &'static str, target: &'static str },

    #[error("{0}")]
    Custom(String),
}

impl ConvertError {
    /// Error with a caller-provided message, for custom converters and actions.
    pub fn custom<M: Display>(message: M) -> Self {
        ConvertError::Custom(message.to_string())
    }

    /// Error for a value whose kind cannot become `target` at all.
    pub fn mismatch(value: &Value, target: &'static str) -> Self {
        match value {
            Value::Empty => ConvertError::Empty { target },
            other => ConvertError::Cast {
                kind: other.kind(),
                target,
            },
        }
    }
}

/// Field types that can be read from a raw cell value.
pub trait FromCell: Sized {
    /// Converts a raw cell value, failing with a [`ConvertError`].
    fn from_cell(value: &Value) -> Result<Self, ConvertError>;
}

/// Converts a raw cell value to `T`.
#[inline]
pub fn convert<T: FromCell>(value: &Value) -> Result<T, ConvertError> {
    T::from_cell(value)
}

impl FromCell for Value {
    #[inline]
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        Ok(value.clone())
    }
}

impl<T: FromCell> FromCell for Option<T> {
    #[inline]
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Empty => Ok(None),
            value => T::from_cell(value).map(Some),
        }
    }
}

impl<T: FromCell> FromCell for Vec<T> {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Array(values) => values.iter().map(T::from_cell).collect(),
            Value::Empty => Ok(Vec::new()),
            other => Err(ConvertError::mismatch(other, "array")),
        }
    }
}

/// Rounds half to even, as spreadsheet-to-integer coercion does.
fn float_to_integer(value: f64, target: &'static str) -> Result<i128, ConvertError> {
    if !value.is_finite() {
        return Err(ConvertError::Overflow {
            value: value.to_string(),
            target,
        });
    }
    Ok(value.round_ties_even() as i128)
}

macro_rules! integer_from_cell {
    ($($target:ty),*) => {$(
        impl FromCell for $target {
            fn from_cell(value: &Value) -> Result<Self, ConvertError> {
                const TARGET: &str = stringify!($target);
                let integer = match value {
                    Value::Int(integer) => i128::from(*integer),
                    Value::Float(float) => float_to_integer(*float, TARGET)?,
                    Value::Bool(boolean) => i128::from(*boolean),
                    Value::String(text) => text.trim().parse::<i128>().map_err(|_| ConvertError::Format {
                        value: text.to_owned(),
                        target: TARGET,
                    })?,
                    other => return Err(ConvertError::mismatch(other, TARGET)),
                };
                <$target>::try_from(integer).map_err(|_| ConvertError::Overflow {
                    value: value.to_string(),
                    target: TARGET,
                })
            }
        }
    )*};
}

integer_from_cell!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromCell for f64 {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Float(float) => Ok(*float),
            Value::Int(integer) => Ok(*integer as f64),
            Value::Bool(boolean) => Ok(if *boolean { 1.0 } else { 0.0 }),
            Value::String(text) => text.trim().parse::<f64>().map_err(|_| ConvertError::Format {
                value: text.to_owned(),
                target: "f64",
            }),
            other => Err(ConvertError::mismatch(other, "f64")),
        }
    }
}

impl FromCell for f32 {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        let double = f64::from_cell(value).map_err(|error| match error {
            ConvertError::Format { value, .. } => ConvertError::Format { value, target: "f32" },
            ConvertError::Empty { .. } => ConvertError::Empty { target: "f32" },
            ConvertError::Cast { kind, .. } => ConvertError::Cast { kind, target: "f32" },
            error => error,
        })?;
        let single = double as f32;
        if double.is_finite() && !single.is_finite() {
            return Err(ConvertError::Overflow {
                value: double.to_string(),
                target: "f32",
            });
        }
        Ok(single)
    }
}

impl FromCell for bool {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Bool(boolean) => Ok(*boolean),
            Value::Int(integer) => Ok(*integer != 0),
            Value::Float(float) => Ok(*float != 0.0),
            Value::String(text) => match text.trim() {
                text if text.eq_ignore_ascii_case("true") => Ok(true),
                text if text.eq_ignore_ascii_case("false") => Ok(false),
                _ => Err(ConvertError::Format {
                    value: text.to_owned(),
                    target: "bool",
                }),
            },
            other => Err(ConvertError::mismatch(other, "bool")),
        }
    }
}

impl FromCell for String {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::String(text) => Ok(text.to_owned()),
            Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::DateTime(_) | Value::Duration(_) => {
                Ok(value.to_string())
            }
            other => Err(ConvertError::mismatch(other, "string")),
        }
    }
}

impl FromCell for Decimal {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Int(integer) => Ok(Decimal::from(*integer)),
            Value::Bool(boolean) => Ok(Decimal::from(u8::from(*boolean))),
            // Shortest round-trip text keeps 27.13 as 27.13 instead of its binary expansion
            Value::Float(float) => Decimal::from_str(&float.to_string()).map_err(|_| ConvertError::Overflow {
                value: float.to_string(),
                target: "decimal",
            }),
            Value::String(text) => Decimal::from_str(text.trim()).map_err(|_| ConvertError::Format {
                value: text.to_owned(),
                target: "decimal",
            }),
            other => Err(ConvertError::mismatch(other, "decimal")),
        }
    }
}

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| parse_date(text).map(|date| date.and_time(NaiveTime::MIN)))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}

impl FromCell for NaiveDateTime {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::DateTime(datetime) => Ok(*datetime),
            Value::String(text) => parse_datetime(text).ok_or_else(|| ConvertError::Format {
                value: text.to_owned(),
                target: "datetime",
            }),
            other => Err(ConvertError::mismatch(other, "datetime")),
        }
    }
}

impl FromCell for NaiveDate {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::DateTime(datetime) => Ok(datetime.date()),
            Value::String(text) => parse_date(text)
                .or_else(|| parse_datetime(text).map(|datetime| datetime.date()))
                .ok_or_else(|| ConvertError::Format {
                    value: text.to_owned(),
                    target: "date",
                }),
            other => Err(ConvertError::mismatch(other, "date")),
        }
    }
}

impl FromCell for NaiveTime {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::DateTime(datetime) => Ok(datetime.time()),
            Value::Duration(duration) if *duration >= Duration::zero() && *duration < Duration::days(1) => {
                Ok(NaiveTime::MIN.overflowing_add_signed(*duration).0)
            }
            Value::Duration(_) => Err(ConvertError::Overflow {
                value: value.to_string(),
                target: "time",
            }),
            Value::String(text) => parse_time(text)
                .or_else(|| parse_datetime(text).map(|datetime| datetime.time()))
                .ok_or_else(|| ConvertError::Format {
                    value: text.to_owned(),
                    target: "time",
                }),
            other => Err(ConvertError::mismatch(other, "time")),
        }
    }
}

impl FromCell for Duration {
    fn from_cell(value: &Value) -> Result<Self, ConvertError> {
        match value {
            Value::Duration(duration) => Ok(*duration),
            other => Err(ConvertError::mismatch(other, "duration")),
        }
    }
}
