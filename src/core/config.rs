//! Database configuration
//!
//! Configuration is plain serde data. Reading it from a file is left to the
//! application; [`Configuration::from_json`] parses an in-memory document.

use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Settings of one named database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Name the database is registered under
    pub name: String,
    /// Backend providing the linker and grammars
    pub backend: DatabaseType,
    /// Backend-specific connection properties
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl DatabaseConfig {
    /// Create a config with no properties
    pub fn new(name: impl Into<String>, backend: DatabaseType) -> Self {
        Self {
            name: name.into(),
            backend,
            properties: HashMap::new(),
        }
    }

    /// Set a property
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Required property, or a configuration error naming it
    pub fn property(&self, key: &str) -> Result<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| DatabaseError::configuration(format!("Undefined {} property", key)))
    }

    /// Optional property with a fallback
    pub fn property_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.properties.get(key).map(String::as_str).unwrap_or(default)
    }
}

/// Whole-application database configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Databases to register
    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,
    /// Ids of migrators to run, in order
    #[serde(default)]
    pub migrations: Vec<String>,
}

impl Configuration {
    /// Parse a JSON document
    ///
    /// ```
    /// use rust_database_layer::core::config::Configuration;
    ///
    /// let config = Configuration::from_json(r#"{
    ///     "databases": [
    ///         { "name": "main", "backend": "sqlite", "properties": { "database": ":memory:" } }
    ///     ],
    ///     "migrations": ["app"]
    /// }"#).unwrap();
    ///
    /// assert_eq!(config.databases[0].name, "main");
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let configuration: Configuration = serde_json::from_str(json)?;

        let mut seen = std::collections::HashSet::new();
        for database in &configuration.databases {
            if !seen.insert(database.name.as_str()) {
                return Err(DatabaseError::configuration(format!(
                    "Duplicate database name '{}'",
                    database.name
                )));
            }
        }

        Ok(configuration)
    }

    /// Configuration of a named database
    pub fn database(&self, name: &str) -> Option<&DatabaseConfig> {
        self.databases.iter().find(|d| d.name == name)
    }
}
