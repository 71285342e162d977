//! Host and wire value coercion
//!
//! A [`Transform`] is applied to every bound parameter before it reaches a
//! [`Link`](crate::core::link::Link), and to every result column after it
//! comes back.

use super::error::Result;
use super::value::DatabaseValue;

/// Value coercion policy of a backend
pub trait Transform: Send + Sync {
    /// Convert a host value to the representation the backend stores
    fn to_database(&self, value: &DatabaseValue) -> Result<DatabaseValue>;

    /// Convert a stored value back, guided by the column's declared type
    fn to_host(&self, value: DatabaseValue, declared_type: Option<&str>) -> Result<DatabaseValue>;

    /// Coerce a parameter list into a fresh vector
    fn to_database_all(&self, values: &[DatabaseValue]) -> Result<Vec<DatabaseValue>> {
        values.iter().map(|value| self.to_database(value)).collect()
    }
}

/// Pass-through transform for backends that accept every host type
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransform;

impl Transform for DefaultTransform {
    fn to_database(&self, value: &DatabaseValue) -> Result<DatabaseValue> {
        Ok(value.clone())
    }

    fn to_host(&self, value: DatabaseValue, _declared_type: Option<&str>) -> Result<DatabaseValue> {
        Ok(value)
    }
}
