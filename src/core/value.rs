//! Database value types
//!
//! This module defines the host values that are bound into statements and
//! read back out of result rows, plus the result containers themselves.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Text form of [`DatabaseValue::Date`]
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Text form of [`DatabaseValue::Time`]
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";
/// Text form of [`DatabaseValue::DateTime`]
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Database value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatabaseValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Arbitrary precision decimal
    Decimal(Decimal),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// Date and time without zone
    DateTime(NaiveDateTime),
    /// Group of values: an `IN (...)` list or one row of a batch insert
    Array(Vec<DatabaseValue>),
}

impl DatabaseValue {
    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DatabaseValue::Bool(v) => Some(*v),
            DatabaseValue::Int(v) => Some(*v != 0),
            DatabaseValue::Long(v) => Some(*v != 0),
            DatabaseValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the value as an i32
    pub fn as_int(&self) -> Option<i32> {
        match self {
            DatabaseValue::Int(v) => Some(*v),
            DatabaseValue::Long(v) => i32::try_from(*v).ok(),
            DatabaseValue::Float(v) => Some(*v as i32),
            DatabaseValue::Double(v) => Some(*v as i32),
            DatabaseValue::String(s) => s.parse().ok(),
            DatabaseValue::Bool(v) => Some(*v as i32),
            _ => None,
        }
    }

    /// Get the value as an i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            DatabaseValue::Long(v) => Some(*v),
            DatabaseValue::Int(v) => Some(*v as i64),
            DatabaseValue::Float(v) => Some(*v as i64),
            DatabaseValue::Double(v) => Some(*v as i64),
            DatabaseValue::String(s) => s.parse().ok(),
            DatabaseValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the value as an f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            DatabaseValue::Double(v) => Some(*v),
            DatabaseValue::Float(v) => Some(*v as f64),
            DatabaseValue::Int(v) => Some(*v as f64),
            DatabaseValue::Long(v) => Some(*v as f64),
            DatabaseValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a decimal
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            DatabaseValue::Decimal(v) => Some(*v),
            DatabaseValue::Int(v) => Some(Decimal::from(*v)),
            DatabaseValue::Long(v) => Some(Decimal::from(*v)),
            DatabaseValue::Double(v) => Decimal::try_from(*v).ok(),
            DatabaseValue::Float(v) => Decimal::try_from(*v).ok(),
            DatabaseValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a string slice (zero-copy for String values)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the value as a string (with conversion)
    pub fn as_string(&self) -> String {
        match self {
            DatabaseValue::Null => "null".to_string(),
            DatabaseValue::Bool(v) => v.to_string(),
            DatabaseValue::Int(v) => v.to_string(),
            DatabaseValue::Long(v) => v.to_string(),
            DatabaseValue::Float(v) => v.to_string(),
            DatabaseValue::Double(v) => v.to_string(),
            DatabaseValue::Decimal(v) => v.to_string(),
            DatabaseValue::String(s) => s.clone(),
            DatabaseValue::Bytes(b) => format!("<{} bytes>", b.len()),
            DatabaseValue::Date(v) => v.format(DATE_FORMAT).to_string(),
            DatabaseValue::Time(v) => v.format(TIME_FORMAT).to_string(),
            DatabaseValue::DateTime(v) => v.format(DATE_TIME_FORMAT).to_string(),
            DatabaseValue::Array(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.as_string()).collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }

    /// Get the value as bytes (zero-copy)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DatabaseValue::Bytes(b) => Some(b),
            DatabaseValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Get the value as a date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            DatabaseValue::Date(v) => Some(*v),
            DatabaseValue::DateTime(v) => Some(v.date()),
            DatabaseValue::String(s) => NaiveDate::parse_from_str(s, DATE_FORMAT).ok(),
            _ => None,
        }
    }

    /// Get the value as a time of day
    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            DatabaseValue::Time(v) => Some(*v),
            DatabaseValue::DateTime(v) => Some(v.time()),
            DatabaseValue::String(s) => NaiveTime::parse_from_str(s, TIME_FORMAT).ok(),
            _ => None,
        }
    }

    /// Get the value as a date time
    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            DatabaseValue::DateTime(v) => Some(*v),
            DatabaseValue::String(s) => NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).ok(),
            _ => None,
        }
    }

    /// Get the grouped values of an array
    pub fn as_array(&self) -> Option<&[DatabaseValue]> {
        match self {
            DatabaseValue::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Check if the value is a group of values
    pub fn is_array(&self) -> bool {
        matches!(self, DatabaseValue::Array(_))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            DatabaseValue::Null => "null",
            DatabaseValue::Bool(_) => "bool",
            DatabaseValue::Int(_) => "int",
            DatabaseValue::Long(_) => "long",
            DatabaseValue::Float(_) => "float",
            DatabaseValue::Double(_) => "double",
            DatabaseValue::Decimal(_) => "decimal",
            DatabaseValue::String(_) => "string",
            DatabaseValue::Bytes(_) => "bytes",
            DatabaseValue::Date(_) => "date",
            DatabaseValue::Time(_) => "time",
            DatabaseValue::DateTime(_) => "datetime",
            DatabaseValue::Array(_) => "array",
        }
    }
}

impl std::fmt::Display for DatabaseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<bool> for DatabaseValue {
    fn from(v: bool) -> Self {
        DatabaseValue::Bool(v)
    }
}

impl From<i32> for DatabaseValue {
    fn from(v: i32) -> Self {
        DatabaseValue::Int(v)
    }
}

impl From<i64> for DatabaseValue {
    fn from(v: i64) -> Self {
        DatabaseValue::Long(v)
    }
}

impl From<f32> for DatabaseValue {
    fn from(v: f32) -> Self {
        DatabaseValue::Float(v)
    }
}

impl From<f64> for DatabaseValue {
    fn from(v: f64) -> Self {
        DatabaseValue::Double(v)
    }
}

impl From<Decimal> for DatabaseValue {
    fn from(v: Decimal) -> Self {
        DatabaseValue::Decimal(v)
    }
}

impl From<String> for DatabaseValue {
    fn from(v: String) -> Self {
        DatabaseValue::String(v)
    }
}

impl From<&str> for DatabaseValue {
    fn from(v: &str) -> Self {
        DatabaseValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(v: Vec<u8>) -> Self {
        DatabaseValue::Bytes(v)
    }
}

impl From<NaiveDate> for DatabaseValue {
    fn from(v: NaiveDate) -> Self {
        DatabaseValue::Date(v)
    }
}

impl From<NaiveTime> for DatabaseValue {
    fn from(v: NaiveTime) -> Self {
        DatabaseValue::Time(v)
    }
}

impl From<NaiveDateTime> for DatabaseValue {
    fn from(v: NaiveDateTime) -> Self {
        DatabaseValue::DateTime(v)
    }
}

impl From<Vec<DatabaseValue>> for DatabaseValue {
    fn from(v: Vec<DatabaseValue>) -> Self {
        DatabaseValue::Array(v)
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// Build a [`DatabaseValue::Array`] from anything convertible
///
/// ```
/// use rust_database_layer::core::value::{values, DatabaseValue};
///
/// let ids = values([1, 2, 3]);
/// assert_eq!(ids.as_array().map(|a| a.len()), Some(3));
/// ```
pub fn values<I, T>(items: I) -> DatabaseValue
where
    I: IntoIterator<Item = T>,
    T: Into<DatabaseValue>,
{
    DatabaseValue::Array(items.into_iter().map(Into::into).collect())
}

/// A row of results, keyed by lower-cased column name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: HashMap<String, DatabaseValue>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value; the column name is stored lower-cased
    pub fn set(&mut self, column: &str, value: DatabaseValue) {
        self.values.insert(column.to_lowercase(), value);
    }

    /// Get a column value, matching the name case-insensitively
    pub fn get(&self, column: &str) -> Option<&DatabaseValue> {
        self.values.get(&column.to_lowercase())
    }

    /// Column names present in this row
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the row into its column map
    pub fn into_map(self) -> HashMap<String, DatabaseValue> {
        self.values
    }
}

/// Ordered list of result rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowList {
    rows: Vec<Row>,
}

impl RowList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row
    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Row at `index`
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// First row, if any
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Start a fresh iteration over the rows
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl From<Vec<Row>> for RowList {
    fn from(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

impl IntoIterator for RowList {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowList {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Outcome of an INSERT, UPDATE or DELETE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Affecting {
    count: u64,
    generated_keys: Vec<DatabaseValue>,
}

impl Affecting {
    /// Create a new result
    pub fn new(count: u64, generated_keys: Vec<DatabaseValue>) -> Self {
        Self {
            count,
            generated_keys,
        }
    }

    /// Number of affected rows
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Keys generated by the backend, in insertion order
    pub fn generated_keys(&self) -> &[DatabaseValue] {
        &self.generated_keys
    }

    /// At least one row was affected
    pub fn success(&self) -> bool {
        self.count > 0
    }

    /// No row was affected
    pub fn fails(&self) -> bool {
        self.count == 0
    }
}
