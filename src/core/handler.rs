//! Statement execution
//!
//! A [`Handler`] pairs a grammar with a link and a transform. It checks the
//! statement kind, compiles, coerces the parameters and dispatches to the
//! matching link operation.

use super::error::{DatabaseError, Result};
use super::link::Link;
use super::transform::Transform;
use super::value::{Affecting, DatabaseValue, RowList};
use crate::grammar::{Compilable, Grammar, StatementKind};
use tracing::debug;

/// Compiles statements with one grammar and runs them on one link
#[derive(Clone, Copy)]
pub struct Handler<'a> {
    grammar: &'a dyn Grammar,
    link: &'a dyn Link,
    transform: &'a dyn Transform,
}

impl<'a> Handler<'a> {
    /// Create a handler
    pub fn new(grammar: &'a dyn Grammar, link: &'a dyn Link, transform: &'a dyn Transform) -> Self {
        Self {
            grammar,
            link,
            transform,
        }
    }

    /// Compile without executing
    pub fn compile(&self, compilable: &Compilable<'_>) -> Result<String> {
        self.grammar.compile(compilable)
    }

    /// Run a SELECT and return its rows
    pub async fn fetch(&self, compilable: &Compilable<'_>) -> Result<RowList> {
        let kind = compilable.kind();
        if kind != StatementKind::Select {
            return Err(DatabaseError::invalid_statement(format!(
                "fetch expects SELECT, got {}",
                kind
            )));
        }

        let (sql, params) = self.prepare(compilable)?;
        self.link.select(&sql, params, self.transform).await
    }

    /// Run an INSERT, UPDATE or DELETE
    pub async fn affect(&self, compilable: &Compilable<'_>) -> Result<Affecting> {
        let kind = compilable.kind();
        if !kind.is_dml() {
            return Err(DatabaseError::invalid_statement(format!(
                "affect expects INSERT, UPDATE or DELETE, got {}",
                kind
            )));
        }

        let (sql, params) = self.prepare(compilable)?;
        match kind {
            StatementKind::Insert => self.link.insert(&sql, params).await,
            StatementKind::Update => self.link.update(&sql, params).await,
            _ => self.link.delete(&sql, params).await,
        }
    }

    /// Run a CREATE, ALTER or DROP
    pub async fn execute(&self, compilable: &Compilable<'_>) -> Result<()> {
        let kind = compilable.kind();
        if !kind.is_ddl() {
            return Err(DatabaseError::invalid_statement(format!(
                "execute expects CREATE, ALTER or DROP, got {}",
                kind
            )));
        }

        let (sql, _) = self.prepare(compilable)?;
        match kind {
            StatementKind::Create => self.link.create(&sql).await,
            StatementKind::Alter => self.link.alter(&sql).await,
            _ => self.link.drop(&sql).await,
        }
    }

    /// Whether `table` exists on the link
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        self.link.table_exists(table).await
    }

    fn prepare(&self, compilable: &Compilable<'_>) -> Result<(String, Vec<DatabaseValue>)> {
        let sql = self.grammar.compile(compilable)?;
        let bindings = compilable.parameters();

        debug!(kind = %compilable.kind(), sql = %sql, bindings = ?bindings, "executing statement");

        let params = self.transform.to_database_all(&bindings)?;
        Ok((sql, params))
    }
}
