use chrono::{DateTime, Utc};
use std::fmt;

/// Temporal values render as `YYYY-MM-DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A bindable statement parameter.
///
/// Every variant carries an `Option` so a NULL still reaches Postgres with the
/// right type; an untyped NULL would make `$n` ambiguous in some positions.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            SqlValue::Bool(None)
                | SqlValue::Int(None)
                | SqlValue::Float(None)
                | SqlValue::Text(None)
                | SqlValue::Timestamp(None)
        )
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => *v,
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(v) => *v,
            _ => None,
        }
    }
}

/// Human-readable rendering for logs. Never spliced into SQL.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match self {
            SqlValue::Bool(Some(v)) => write!(f, "{}", v),
            SqlValue::Int(Some(v)) => write!(f, "{}", v),
            SqlValue::Float(Some(v)) => write!(f, "{}", v),
            SqlValue::Text(Some(v)) => write!(f, "'{}'", v),
            SqlValue::Timestamp(Some(v)) => write!(f, "'{}'", v.format(TIMESTAMP_FORMAT)),
            _ => f.write_str("NULL"),
        }
    }
}

macro_rules! sql_value_from {
    ($variant:ident, $ty:ty, $conv:expr) => {
        impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                SqlValue::$variant(Some($conv(v)))
            }
        }

        impl From<Option<$ty>> for SqlValue {
            fn from(v: Option<$ty>) -> Self {
                SqlValue::$variant(v.map($conv))
            }
        }
    };
}

sql_value_from!(Bool, bool, |v| v);
sql_value_from!(Int, i64, |v| v);
sql_value_from!(Int, i32, i64::from);
sql_value_from!(Float, f64, |v| v);
sql_value_from!(Text, String, |v| v);
sql_value_from!(Timestamp, DateTime<Utc>, |v| v);

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(Some(v.clone()))
    }
}
