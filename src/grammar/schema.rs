//! CREATE, ALTER and DROP compilation
//!
//! Column and constraint definitions are assembled from small fragment
//! methods in a fixed order. Dialects override fragments, never the order.
//!
//! ALTER renders one complete `ALTER TABLE` statement per change, in the
//! order: dropped constraints, dropped columns, added or altered columns,
//! added constraints.

use super::{
    glue, Bindings, ColumnDefinition, ColumnType, ComponentBag, ConstraintDefinition,
    ConstraintType, CreateColumn, Grammar, StatementKind,
};
use crate::core::error::{DatabaseError, Result};
use crate::core::value::DatabaseValue;

/// Schema statement compiler
pub trait SchemaGrammar: Grammar {
    fn column_type(&self, column_type: ColumnType) -> String {
        column_type.sql_name().to_string()
    }

    fn constraint_type(&self, constraint_type: ConstraintType) -> String {
        constraint_type.sql_name().to_string()
    }

    /// `(length)` or `(length,scale)`, nothing when no length is set
    fn length(&self, length: u32, scale: u32) -> String {
        match (length, scale) {
            (0, _) => String::new(),
            (length, 0) => format!("({})", length),
            (length, scale) => format!("({},{})", length, scale),
        }
    }

    fn unsigned(&self, unsigned: bool) -> String {
        if unsigned { "UNSIGNED" } else { "" }.to_string()
    }

    fn nullable(&self, nullable: bool) -> String {
        if nullable { "NULL" } else { "NOT NULL" }.to_string()
    }

    fn auto_increment(&self, incremented: bool) -> String {
        if incremented { "AUTO_INCREMENT" } else { "" }.to_string()
    }

    /// `DEFAULT '<value>'`; booleans render as `'1'` and `'0'`
    fn default_value(&self, value: Option<&DatabaseValue>) -> String {
        match value {
            None => String::new(),
            Some(DatabaseValue::Null) => "DEFAULT NULL".to_string(),
            Some(DatabaseValue::Bool(flag)) => {
                format!("DEFAULT '{}'", if *flag { 1 } else { 0 })
            }
            Some(value) => format!("DEFAULT '{}'", value.as_string().replace('\'', "''")),
        }
    }

    /// Full column definition
    fn column(&self, definition: &ColumnDefinition) -> String {
        glue(&[
            &self.wrap(&definition.name),
            &self.column_type(definition.column_type),
            &self.length(definition.length, definition.scale),
            &self.unsigned(definition.unsigned),
            &self.nullable(definition.nullable),
            &self.auto_increment(definition.incremented),
            &self.default_value(definition.default.as_ref()),
        ])
    }

    fn add_column(&self, definition: &ColumnDefinition) -> String {
        glue(&["ADD", &self.column(definition)])
    }

    fn alter_column_keyword(&self) -> String {
        "MODIFY COLUMN".to_string()
    }

    fn alter_column(&self, definition: &ColumnDefinition) -> String {
        glue(&[&self.alter_column_keyword(), &self.column(definition)])
    }

    fn drop_column(&self, name: &str) -> String {
        glue(&["DROP COLUMN", &self.wrap(name)])
    }

    /// `ON DELETE <action>`; nothing when no action is given
    fn on_delete(&self, action: &str) -> String {
        if action.trim().is_empty() {
            return String::new();
        }
        glue(&["ON DELETE", action])
    }

    fn on_update(&self, action: &str) -> String {
        if action.trim().is_empty() {
            return String::new();
        }
        glue(&["ON UPDATE", action])
    }

    /// Constraint names may be empty (an unnamed primary key drop)
    fn constraint_name(&self, name: &str) -> String {
        if name.is_empty() {
            String::new()
        } else {
            self.wrap(name)
        }
    }

    /// `CONSTRAINT name TYPE ( column )` plus the reference of a foreign key
    fn constraint(&self, definition: &ConstraintDefinition) -> String {
        let base = glue(&[
            "CONSTRAINT",
            &self.constraint_name(&definition.name),
            &self.constraint_type(definition.constraint_type),
            "(",
            &self.escape(&definition.column),
            ")",
        ]);

        match &definition.reference {
            Some(reference) => glue(&[
                &base,
                "REFERENCES",
                &format!(
                    "{}({})",
                    self.wrap(&reference.table),
                    self.escape(&reference.column)
                ),
                &self.on_delete(&reference.on_delete),
                &self.on_update(&reference.on_update),
            ]),
            None => base,
        }
    }

    fn add_constraint(&self, definition: &ConstraintDefinition) -> String {
        glue(&["ADD", &self.constraint(definition)])
    }

    fn drop_constraint_keyword(&self, constraint_type: ConstraintType) -> String {
        self.constraint_type(constraint_type)
    }

    fn drop_constraint(&self, constraint_type: ConstraintType, name: &str) -> String {
        glue(&[
            "DROP",
            &self.drop_constraint_keyword(constraint_type),
            &self.constraint_name(name),
        ])
    }

    /// One `ALTER TABLE <table> <change> ;` statement
    fn alter_statement(&self, table: &str, change: &str) -> String {
        glue(&["ALTER TABLE", table, change, ";"])
    }

    /// Statement dropping a constraint of the unwrapped `table`
    fn drop_constraint_statement(
        &self,
        table: &str,
        constraint_type: ConstraintType,
        name: &str,
    ) -> String {
        self.alter_statement(&self.wrap(table), &self.drop_constraint(constraint_type, name))
    }

    /// Statement adding a constraint to the unwrapped `table`
    fn add_constraint_statement(&self, table: &str, definition: &ConstraintDefinition) -> String {
        self.alter_statement(&self.wrap(table), &self.add_constraint(definition))
    }

    /// Constraint rendered inside `CREATE TABLE ( ... )`, if the dialect allows it there
    fn inline_constraint(&self, definition: &ConstraintDefinition) -> Option<String> {
        Some(self.constraint(definition))
    }

    /// Statement appended after `CREATE TABLE` for constraints that cannot be
    /// inline; `table` is unwrapped
    fn trailing_constraint(&self, _table: &str, _definition: &ConstraintDefinition) -> Option<String> {
        None
    }

    fn table_name<'c>(&self, components: &'c ComponentBag) -> Result<&'c str> {
        components
            .table()
            .ok_or_else(|| DatabaseError::compilation("Undefined table"))
    }

    fn compile_table(&self, components: &ComponentBag) -> Result<String> {
        Ok(self.wrap(self.table_name(components)?))
    }

    fn compile_create(&self, components: &ComponentBag) -> Result<String> {
        let name = self.table_name(components)?;
        let table = self.wrap(name);

        let mut definitions: Vec<String> = components
            .create_columns()
            .into_iter()
            .map(|column| self.column(column.definition()))
            .collect();

        let mut trailing = Vec::new();
        for constraint in components.create_constraints() {
            if let Some(inline) = self.inline_constraint(constraint) {
                definitions.push(inline);
            }
            if let Some(statement) = self.trailing_constraint(name, constraint) {
                trailing.push(statement);
            }
        }

        if definitions.is_empty() {
            return Err(DatabaseError::compilation("Undefined columns in create"));
        }

        let create = glue(&["CREATE TABLE", &table, "(", &definitions.join(","), ");"]);
        Ok(glue(&[&create, &trailing.join(" ")]))
    }

    fn compile_alter(&self, components: &ComponentBag) -> Result<String> {
        let name = self.table_name(components)?;
        let table = self.wrap(name);
        let mut statements = Vec::new();

        for (constraint_type, constraint) in components.drop_constraints() {
            statements.push(self.drop_constraint_statement(name, constraint_type, constraint));
        }
        for column in components.drop_columns() {
            statements.push(self.alter_statement(&table, &self.drop_column(column)));
        }
        for column in components.create_columns() {
            let change = match column {
                CreateColumn::Add(definition) => self.add_column(definition),
                CreateColumn::Alter(definition) => self.alter_column(definition),
            };
            statements.push(self.alter_statement(&table, &change));
        }
        for constraint in components.create_constraints() {
            statements.push(self.add_constraint_statement(name, constraint));
        }

        if statements.is_empty() {
            return Err(DatabaseError::compilation("Undefined changes in alter"));
        }

        Ok(statements.join(" "))
    }

    fn compile_drop(&self, components: &ComponentBag) -> Result<String> {
        let table = self.compile_table(components)?;
        Ok(glue(&["DROP TABLE", &table, ";"]))
    }

    /// Dispatch on statement kind; query kinds are not handled here
    fn compile_schema(&self, kind: StatementKind, components: &ComponentBag) -> Result<Option<String>> {
        let sql = match kind {
            StatementKind::Create => self.compile_create(components)?,
            StatementKind::Alter => self.compile_alter(components)?,
            StatementKind::Drop => self.compile_drop(components)?,
            _ => return Ok(None),
        };
        Ok(Some(sql))
    }
}

/// Generic schema dialect: identifiers are left unquoted
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSchemaGrammar;

impl Grammar for GenericSchemaGrammar {
    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        _bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_schema(kind, components)
    }
}

impl SchemaGrammar for GenericSchemaGrammar {}
