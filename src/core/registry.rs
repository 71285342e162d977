//! Registry of backend supports, databases and migrators
//!
//! The registry is a plain owned value built during application setup. A
//! [`Configuration`] names the databases to create and the migrators to run;
//! backends are looked up by [`DatabaseType`] in a map of [`SupportFactory`]
//! functions.

use super::config::{Configuration, DatabaseConfig};
use super::database::{Database, SupportFactory};
use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use super::migration::Migrator;
use std::collections::HashMap;
use tracing::{debug, info};

/// Owner of every configured database
#[derive(Debug)]
pub struct Registry {
    supports: HashMap<DatabaseType, SupportFactory>,
    databases: HashMap<String, Database>,
    migrators: HashMap<String, Migrator>,
    migrations: Vec<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry knowing the backends bundled with this crate
    pub fn new() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "sqlite")]
        registry.register_support(DatabaseType::Sqlite, crate::backends::sqlite::sqlite_support);
        registry
    }

    /// Create a registry with no backends
    pub fn empty() -> Self {
        Self {
            supports: HashMap::new(),
            databases: HashMap::new(),
            migrators: HashMap::new(),
            migrations: Vec::new(),
        }
    }

    /// Create a registry and add every database of `configuration`
    pub fn from_configuration(configuration: Configuration) -> Result<Self> {
        let mut registry = Self::new();
        registry.load(configuration)?;
        Ok(registry)
    }

    /// Add every configured database and remember the migrator ids
    pub fn load(&mut self, configuration: Configuration) -> Result<()> {
        for database in configuration.databases {
            self.add_database(database)?;
        }
        self.migrations.extend(configuration.migrations);
        Ok(())
    }

    /// Register or replace the support of a backend
    pub fn register_support(&mut self, backend: DatabaseType, factory: SupportFactory) {
        self.supports.insert(backend, factory);
    }

    /// Whether a backend has a registered support
    pub fn supports(&self, backend: DatabaseType) -> bool {
        self.supports.contains_key(&backend)
    }

    /// Create a closed database from its configuration
    pub fn add_database(&mut self, config: DatabaseConfig) -> Result<&mut Database> {
        let factory = *self.supports.get(&config.backend).ok_or_else(|| {
            DatabaseError::configuration(format!(
                "No support registered for backend {}",
                config.backend
            ))
        })?;

        if self.databases.contains_key(&config.name) {
            return Err(DatabaseError::configuration(format!(
                "Duplicate database name '{}'",
                config.name
            )));
        }

        debug!(database = %config.name, backend = %config.backend, "registered database");
        let name = config.name.clone();
        let database = Database::new(config, factory());
        Ok(self.databases.entry(name).or_insert(database))
    }

    /// Named database
    pub fn database(&self, name: &str) -> Result<&Database> {
        self.databases
            .get(name)
            .ok_or_else(|| DatabaseError::DatabaseNotFound(name.to_string()))
    }

    /// Named database, mutably
    pub fn database_mut(&mut self, name: &str) -> Result<&mut Database> {
        self.databases
            .get_mut(name)
            .ok_or_else(|| DatabaseError::DatabaseNotFound(name.to_string()))
    }

    /// Names of the registered databases, sorted
    pub fn database_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.databases.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Open every registered database
    pub async fn open_all(&mut self) -> Result<()> {
        for database in self.databases.values_mut() {
            database.open().await?;
        }
        Ok(())
    }

    /// Close every registered database
    pub async fn close_all(&mut self) -> Result<()> {
        for database in self.databases.values_mut() {
            database.close().await?;
        }
        Ok(())
    }

    /// Register a migrator under `id`
    pub fn register_migrator(&mut self, id: impl Into<String>, migrator: Migrator) {
        self.migrators.insert(id.into(), migrator);
    }

    /// Registered migrator
    pub fn migrator(&self, id: &str) -> Option<&Migrator> {
        self.migrators.get(id)
    }

    /// Migrator ids that [`migrate`](Registry::migrate) runs, in order
    pub fn migrations(&self) -> &[String] {
        &self.migrations
    }

    /// Run every configured migrator against the named database
    ///
    /// Returns the applied migration ids across all migrators.
    pub async fn migrate(&self, database: &str) -> Result<Vec<String>> {
        let db = self.database(database)?;

        let mut applied = Vec::new();
        for id in &self.migrations {
            let migrator = self
                .migrators
                .get(id)
                .ok_or_else(|| DatabaseError::migration(format!("Undefined migrator {}", id)))?;
            applied.extend(migrator.migrate(db).await?);
        }

        info!(database, count = applied.len(), "migrations complete");
        Ok(applied)
    }
}
