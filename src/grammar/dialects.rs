//! MySQL and H2 dialects
//!
//! Both keep the generic statement assembly. MySQL quotes identifiers with
//! backticks and drops unique keys as indexes; H2 leaves identifiers bare and
//! spells column redefinition and unique drops its own way.

use super::{Bindings, ComponentBag, ConstraintType, Grammar, QueryGrammar, SchemaGrammar, StatementKind};
use crate::core::error::Result;

fn backtick(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// MySQL query dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlQueryGrammar;

impl Grammar for MysqlQueryGrammar {
    fn wrap(&self, identifier: &str) -> String {
        backtick(identifier)
    }

    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_query(kind, components, bindings)
    }
}

impl QueryGrammar for MysqlQueryGrammar {}

/// MySQL schema dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlSchemaGrammar;

impl Grammar for MysqlSchemaGrammar {
    fn wrap(&self, identifier: &str) -> String {
        backtick(identifier)
    }

    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        _bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_schema(kind, components)
    }
}

impl SchemaGrammar for MysqlSchemaGrammar {
    fn drop_constraint_keyword(&self, constraint_type: ConstraintType) -> String {
        match constraint_type {
            ConstraintType::Unique => "INDEX".to_string(),
            other => self.constraint_type(other),
        }
    }
}

/// H2 query dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct H2QueryGrammar;

impl Grammar for H2QueryGrammar {
    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_query(kind, components, bindings)
    }
}

impl QueryGrammar for H2QueryGrammar {}

/// H2 schema dialect
#[derive(Debug, Clone, Copy, Default)]
pub struct H2SchemaGrammar;

impl Grammar for H2SchemaGrammar {
    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        _bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_schema(kind, components)
    }
}

impl SchemaGrammar for H2SchemaGrammar {
    fn alter_column_keyword(&self) -> String {
        "ALTER COLUMN".to_string()
    }

    fn drop_constraint_keyword(&self, constraint_type: ConstraintType) -> String {
        match constraint_type {
            ConstraintType::Unique => "CONSTRAINT".to_string(),
            other => self.constraint_type(other),
        }
    }
}
