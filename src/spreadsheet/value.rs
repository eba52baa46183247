use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// Raw, dynamically typed value of a single spreadsheet cell.
///
/// This is what a [`SheetReader`](crate::spreadsheet::SheetReader) hands out
/// for every column of the current row, before any conversion happens.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Blank cell or a column past the end of the row
    #[default]
    Empty,
    /// Text values (inline or shared strings)
    String(String),
    /// Whole numbers stored as integers
    Int(i64),
    /// Numeric values
    Float(f64),
    /// Boolean values (true/false)
    Bool(bool),
    /// Date/time values (date-formatted numbers or ISO 8601 strings)
    DateTime(NaiveDateTime),
    /// ISO 8601 durations
    Duration(Duration),
    /// Error values such as `#DIV/0!`
    Error(String),
    /// Sequence of values, produced only by custom readers
    Array(Vec<Value>),
}

impl Value {
    /// Returns true for blank cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Returns true for spreadsheet error cells.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Short name of the value kind, used in conversion messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::DateTime(_) => "datetime",
            Value::Duration(_) => "duration",
            Value::Error(_) => "error",
            Value::Array(_) => "array",
        }
    }

    /// Borrows the text of a string cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::String(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            Value::Duration(value) => {
                let seconds = value.num_seconds();
                let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
                write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
            }
            Value::Error(value) => write!(f, "{value}"),
            Value::Array(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::DateTime(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<Duration> for Value {
    fn from(value: Duration) -> Self {
        Value::Duration(value)
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(value: Option<V>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(values: Vec<V>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}
