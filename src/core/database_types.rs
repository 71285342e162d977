//! Backend identifiers
//!
//! A [`DatabaseType`] selects the support bundle (linker, grammars and
//! transform) a configured database is built with.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Backends a database can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Dialect-neutral grammar, no bundled driver
    #[default]
    Generic,
    /// SQLite through rusqlite
    Sqlite,
    /// MySQL/MariaDB dialect
    Mysql,
    /// H2 dialect
    H2,
}

impl DatabaseType {
    /// Convert database type to string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            DatabaseType::Generic => "generic",
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Mysql => "mysql",
            DatabaseType::H2 => "h2",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "sql" => Ok(DatabaseType::Generic),
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            "mysql" | "mariadb" => Ok(DatabaseType::Mysql),
            "h2" => Ok(DatabaseType::H2),
            _ => Err(format!("Invalid database type: '{}'", s)),
        }
    }
}
