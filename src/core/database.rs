//! Named databases and their backend support
//!
//! A [`Support`] bundles everything backend-specific: the linker that opens
//! connections, the query and schema grammars, and the value transform. A
//! [`Database`] pairs a support with its configuration and, once opened, a
//! live link.

use super::blueprint::Blueprint;
use super::config::DatabaseConfig;
use super::error::{DatabaseError, Result};
use super::handler::Handler;
use super::link::{Link, Linker};
use super::query_builder::Query;
use super::transform::Transform;
use super::value::{Affecting, DatabaseValue};
use crate::grammar::{Grammar, QueryGrammar, SchemaGrammar};
use tracing::debug;

/// Builds the support bundle of one backend
pub type SupportFactory = fn() -> Support;

/// Backend-specific collaborators of a database
pub struct Support {
    linker: Box<dyn Linker>,
    query_grammar: Box<dyn Grammar>,
    schema_grammar: Box<dyn Grammar>,
    transform: Box<dyn Transform>,
}

impl Support {
    /// Bundle a linker, both grammars and a transform
    pub fn new<L, Q, S, T>(linker: L, query_grammar: Q, schema_grammar: S, transform: T) -> Self
    where
        L: Linker + 'static,
        Q: QueryGrammar + 'static,
        S: SchemaGrammar + 'static,
        T: Transform + 'static,
    {
        Self {
            linker: Box::new(linker),
            query_grammar: Box::new(query_grammar),
            schema_grammar: Box::new(schema_grammar),
            transform: Box::new(transform),
        }
    }

    pub fn linker(&self) -> &dyn Linker {
        self.linker.as_ref()
    }

    pub fn query_grammar(&self) -> &dyn Grammar {
        self.query_grammar.as_ref()
    }

    pub fn schema_grammar(&self) -> &dyn Grammar {
        self.schema_grammar.as_ref()
    }

    pub fn transform(&self) -> &dyn Transform {
        self.transform.as_ref()
    }
}

impl std::fmt::Debug for Support {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Support").finish_non_exhaustive()
    }
}

/// A configured database
///
/// Statements can only be built once the database is [open](Database::open).
pub struct Database {
    config: DatabaseConfig,
    support: Support,
    link: Option<Box<dyn Link>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Database {
    /// Create a closed database
    pub fn new(config: DatabaseConfig, support: Support) -> Self {
        Self {
            config,
            support,
            link: None,
        }
    }

    /// Create an already open database over an existing link
    pub fn with_link(config: DatabaseConfig, support: Support, link: Box<dyn Link>) -> Self {
        Self {
            config,
            support,
            link: Some(link),
        }
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn support(&self) -> &Support {
        &self.support
    }

    /// Whether a link is open
    pub fn is_open(&self) -> bool {
        self.link.is_some()
    }

    /// Open a link through the support's linker; no-op when already open
    pub async fn open(&mut self) -> Result<()> {
        if self.link.is_some() {
            return Ok(());
        }

        let link = self.support.linker.open(&self.config).await?;
        debug!(database = %self.config.name, backend = %self.config.backend, "opened link");
        self.link = Some(link);
        Ok(())
    }

    /// Close the link, if any
    pub async fn close(&mut self) -> Result<()> {
        if let Some(link) = self.link.take() {
            link.close().await?;
            debug!(database = %self.config.name, "closed link");
        }
        Ok(())
    }

    fn link(&self) -> Result<&dyn Link> {
        self.link
            .as_deref()
            .ok_or_else(|| DatabaseError::NotConnected(self.config.name.clone()))
    }

    /// Handler for query statements
    pub fn query_handler(&self) -> Result<Handler<'_>> {
        Ok(Handler::new(
            self.support.query_grammar(),
            self.link()?,
            self.support.transform(),
        ))
    }

    /// Handler for schema statements
    pub fn schema_handler(&self) -> Result<Handler<'_>> {
        Ok(Handler::new(
            self.support.schema_grammar(),
            self.link()?,
            self.support.transform(),
        ))
    }

    /// Start a query with no table
    pub fn query(&self) -> Result<Query<'_>> {
        Ok(Query::with_handler(self.query_handler()?))
    }

    /// Start a query on `table`
    pub fn table(&self, table: &str) -> Result<Query<'_>> {
        Ok(self.query()?.table(table))
    }

    /// Insert one row
    pub async fn insert(
        &self,
        table: &str,
        columns: &str,
        row: impl Into<DatabaseValue>,
    ) -> Result<Affecting> {
        self.table(table)?.insert(columns, row).await
    }

    /// Update every row of `table`
    pub async fn update(
        &self,
        table: &str,
        columns: &str,
        row: impl Into<DatabaseValue>,
    ) -> Result<Affecting> {
        self.table(table)?.update(columns, row).await
    }

    /// Delete every row of `table`
    pub async fn delete(&self, table: &str) -> Result<Affecting> {
        self.table(table)?.delete().await
    }

    /// Create `table` with the columns and constraints declared by `define`
    pub async fn create<F>(&self, table: &str, define: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::new(table);
        define(&mut blueprint);
        self.schema_handler()?.execute(&blueprint.to_create()).await
    }

    /// Apply the changes declared by `define` to `table`
    pub async fn alter<F>(&self, table: &str, define: F) -> Result<()>
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut blueprint = Blueprint::new(table);
        define(&mut blueprint);
        self.schema_handler()?.execute(&blueprint.to_alter()).await
    }

    /// Drop `table`
    pub async fn drop(&self, table: &str) -> Result<()> {
        let blueprint = Blueprint::new(table);
        self.schema_handler()?.execute(&blueprint.to_drop()).await
    }

    /// Whether `table` exists
    pub async fn exists(&self, table: &str) -> Result<bool> {
        self.link()?.table_exists(table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::database_types::DatabaseType;
    use crate::core::link::testing::RecordingLink;
    use crate::core::transform::DefaultTransform;
    use crate::core::value::values;
    use crate::grammar::{GenericQueryGrammar, GenericSchemaGrammar};
    use async_trait::async_trait;

    struct RecordingLinker;

    #[async_trait]
    impl Linker for RecordingLinker {
        async fn open(&self, _config: &DatabaseConfig) -> Result<Box<dyn Link>> {
            Ok(Box::new(RecordingLink {
                tables: vec!["users".to_string()],
                ..RecordingLink::default()
            }))
        }
    }

    fn support() -> Support {
        Support::new(
            RecordingLinker,
            GenericQueryGrammar,
            GenericSchemaGrammar,
            DefaultTransform,
        )
    }

    #[tokio::test]
    async fn test_closed_database_refuses_statements() {
        let db = Database::new(DatabaseConfig::new("main", DatabaseType::Generic), support());

        assert!(!db.is_open());
        let err = db.table("t").unwrap_err();
        assert_eq!(err.to_string(), "Connection to database main isn't open");
        assert!(matches!(db.exists("t").await, Err(DatabaseError::NotConnected(_))));
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let mut db = Database::new(DatabaseConfig::new("main", DatabaseType::Generic), support());

        db.open().await.unwrap();
        assert!(db.is_open());
        assert!(db.exists("users").await.unwrap());
        assert!(!db.exists("posts").await.unwrap());

        db.close().await.unwrap();
        assert!(!db.is_open());
    }

    #[tokio::test]
    async fn test_statements_route_to_their_grammar() {
        let mut db = Database::new(DatabaseConfig::new("main", DatabaseType::Generic), support());
        db.open().await.unwrap();

        db.create("users", |t| {
            t.integer("id");
        })
        .await
        .unwrap();
        db.insert("users", "id", 1).await.unwrap();
        db.update("users", "id", values([2])).await.unwrap();
        db.delete("users").await.unwrap();
        db.alter("users", |t| t.drop_column("id")).await.unwrap();
        db.drop("users").await.unwrap();

        let err = db.alter("users", |_| {}).await.unwrap_err();
        assert!(err.is_compilation());
    }
}
