//! Execution channel between compiled statements and a backend
//!
//! A [`Link`] receives SQL text with `?` placeholders and the already
//! coerced parameters in placeholder order. A [`Linker`] opens links from a
//! [`DatabaseConfig`].

use super::config::DatabaseConfig;
use super::error::Result;
use super::transform::Transform;
use super::value::{Affecting, DatabaseValue, RowList};
use async_trait::async_trait;

/// An open connection to a backend
///
/// # Thread Safety
/// Implementations must be usable from any task; operations may be
/// serialized internally.
#[async_trait]
pub trait Link: Send + Sync {
    /// Run a SELECT; result columns are passed through `transform`
    async fn select(
        &self,
        sql: &str,
        params: Vec<DatabaseValue>,
        transform: &dyn Transform,
    ) -> Result<RowList>;

    /// Run an INSERT, collecting generated keys
    async fn insert(&self, sql: &str, params: Vec<DatabaseValue>) -> Result<Affecting>;

    /// Run an UPDATE
    async fn update(&self, sql: &str, params: Vec<DatabaseValue>) -> Result<Affecting>;

    /// Run a DELETE
    async fn delete(&self, sql: &str, params: Vec<DatabaseValue>) -> Result<Affecting>;

    /// Run a CREATE TABLE, which may span several statements
    async fn create(&self, sql: &str) -> Result<()>;

    /// Run an ALTER TABLE batch, one statement per change
    async fn alter(&self, sql: &str) -> Result<()>;

    /// Run a DROP TABLE
    async fn drop(&self, sql: &str) -> Result<()>;

    /// Whether a table exists
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory of links for one backend
#[async_trait]
pub trait Linker: Send + Sync {
    /// Open a link using the database's configuration properties
    async fn open(&self, config: &DatabaseConfig) -> Result<Box<dyn Link>>;
}
