//! Statement compilation
//!
//! Builders record one [`Component`] per clause in a [`ComponentBag`] and the
//! values those clauses bind in [`Bindings`]. A [`Grammar`] turns the pair into
//! SQL text with `?` placeholders whose order matches
//! [`Bindings::get_array`] for the statement kind.
//!
//! The default methods of [`QueryGrammar`] and [`SchemaGrammar`] are the
//! generic dialect. A dialect overrides only the fragments it spells
//! differently; see [`dialects`] and the SQLite backend.

pub mod bindings;
pub mod component;
pub mod dialects;
pub mod query;
pub mod schema;

pub use bindings::{BindingCategory, Bindings};
pub use component::{
    ColumnDefinition, ColumnType, Component, ComponentBag, ComponentKind, Condition,
    ConstraintDefinition, ConstraintType, CreateColumn, ForeignReference, JoinClause,
    JoinComponent, JoinType,
};
pub use dialects::{H2QueryGrammar, H2SchemaGrammar, MysqlQueryGrammar, MysqlSchemaGrammar};
pub use query::{GenericQueryGrammar, QueryGrammar};
pub use schema::{GenericSchemaGrammar, SchemaGrammar};

use crate::core::error::{DatabaseError, Result};
use crate::core::value::DatabaseValue;

/// Kind of statement a [`Compilable`] represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// SELECT
    Select,
    /// INSERT
    Insert,
    /// UPDATE
    Update,
    /// DELETE
    Delete,
    /// CREATE TABLE
    Create,
    /// ALTER TABLE
    Alter,
    /// DROP TABLE
    Drop,
}

impl StatementKind {
    /// SQL keyword of the statement
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Create => "CREATE",
            StatementKind::Alter => "ALTER",
            StatementKind::Drop => "DROP",
        }
    }

    /// Binding categories used by this kind, in placeholder order
    pub fn binding_categories(&self) -> &'static [BindingCategory] {
        match self {
            StatementKind::Select => &[BindingCategory::Wheres, BindingCategory::Havings],
            StatementKind::Insert => &[BindingCategory::Values],
            StatementKind::Update => &[BindingCategory::Values, BindingCategory::Wheres],
            StatementKind::Delete => &[BindingCategory::Wheres],
            StatementKind::Create | StatementKind::Alter | StatementKind::Drop => &[],
        }
    }

    /// Data manipulation statement (INSERT, UPDATE, DELETE)
    pub fn is_dml(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        )
    }

    /// Schema statement (CREATE, ALTER, DROP)
    pub fn is_ddl(&self) -> bool {
        matches!(
            self,
            StatementKind::Create | StatementKind::Alter | StatementKind::Drop
        )
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The unit of compilation: a statement kind over a bag and its bindings
///
/// A `Compilable` borrows the builder's state, so compiling it is a pure read
/// and compiling it twice yields the same text.
#[derive(Debug, Clone, Copy)]
pub struct Compilable<'a> {
    kind: StatementKind,
    components: &'a ComponentBag,
    bindings: &'a Bindings,
}

impl<'a> Compilable<'a> {
    /// View `components` and `bindings` as a statement of `kind`
    pub fn new(kind: StatementKind, components: &'a ComponentBag, bindings: &'a Bindings) -> Self {
        Self {
            kind,
            components,
            bindings,
        }
    }

    /// Statement kind
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Clause components
    pub fn components(&self) -> &'a ComponentBag {
        self.components
    }

    /// Bound values
    pub fn bindings(&self) -> &'a Bindings {
        self.bindings
    }

    /// Flattened parameters in placeholder order
    pub fn parameters(&self) -> Vec<DatabaseValue> {
        self.bindings.get_array(self.kind.binding_categories())
    }
}

/// Base dialect rules shared by query and schema grammars
///
/// Implementors supply [`Grammar::compile_statement`]; everything else has a
/// default that a dialect may override.
pub trait Grammar: Send + Sync {
    /// Quote a single identifier segment
    fn wrap(&self, identifier: &str) -> String {
        identifier.to_string()
    }

    /// Compile a statement, returning `None` for kinds this grammar does not handle
    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        bindings: &Bindings,
    ) -> Result<Option<String>>;

    /// Compile a statement to SQL text
    fn compile(&self, compilable: &Compilable<'_>) -> Result<String> {
        let kind = compilable.kind();
        self.compile_statement(kind, compilable.components(), compilable.bindings())?
            .ok_or_else(|| DatabaseError::unsupported(kind.name()))
    }

    /// Wrap both sides of a `schema.table` reference; `*` and expressions stay bare
    fn dot(&self, identifier: &str) -> String {
        if identifier.contains('(') {
            return identifier.to_string();
        }

        let wrap_segment = |segment: &str| {
            if segment == "*" {
                segment.to_string()
            } else {
                self.wrap(segment)
            }
        };

        match identifier.split_once('.') {
            Some((owner, name)) => format!("{}.{}", wrap_segment(owner), wrap_segment(name)),
            None => wrap_segment(identifier),
        }
    }

    /// Wrap a `table alias` pair
    fn alias(&self, identifier: &str) -> String {
        match identifier.split_once(' ') {
            Some((name, alias)) => format!("{} {}", self.dot(name), self.dot(alias.trim())),
            None => self.dot(identifier),
        }
    }

    /// Wrap a `name AS alias` pair
    fn as_alias(&self, identifier: &str) -> String {
        // ASCII lowering keeps byte offsets aligned with `identifier`
        let lowered = identifier.to_ascii_lowercase();
        match lowered.find(" as ") {
            Some(index) => format!(
                "{} AS {}",
                self.alias(identifier[..index].trim()),
                self.alias(identifier[index + 4..].trim())
            ),
            None => self.alias(identifier),
        }
    }

    /// Escape a comma separated identifier list
    fn escape(&self, identifiers: &str) -> String {
        if identifiers == "*" {
            return identifiers.to_string();
        }

        split(identifiers)
            .map(|segment| self.as_alias(segment))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Split a comma separated list, trimming each entry and skipping blanks
pub fn split(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Join the non-empty fragments with `separator`
pub fn glue_with(separator: &str, fragments: &[&str]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Join the non-empty fragments with single spaces
pub fn glue(fragments: &[&str]) -> String {
    glue_with(" ", fragments)
}
