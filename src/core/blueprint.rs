//! Table definition builder
//!
//! A [`Blueprint`] collects column and constraint changes for one table. The
//! same blueprint compiles as CREATE, ALTER or DROP depending on the
//! finishing call.
//!
//! ```
//! use rust_database_layer::core::blueprint::Blueprint;
//! use rust_database_layer::grammar::{GenericSchemaGrammar, Grammar};
//!
//! let mut users = Blueprint::new("users");
//! users.integer("id").incremented();
//! users.string("email", 120);
//! users.primary("id");
//!
//! let sql = GenericSchemaGrammar.compile(&users.to_create()).unwrap();
//! assert_eq!(
//!     sql,
//!     "CREATE TABLE users ( id INTEGER NOT NULL AUTO_INCREMENT,email VARCHAR (120) NOT NULL,\
//!      CONSTRAINT id_pk PRIMARY KEY ( id ) );"
//! );
//! ```

use super::value::DatabaseValue;
use crate::grammar::{
    Bindings, ColumnDefinition, ColumnType, Compilable, Component, ComponentBag,
    ConstraintDefinition, ConstraintType, CreateColumn, ForeignReference, StatementKind,
};

/// Schema statement builder for one table
#[derive(Debug, Clone)]
pub struct Blueprint {
    table: String,
    components: ComponentBag,
    bindings: Bindings,
}

/// Modifiers of the column just declared on a [`Blueprint`]
pub struct ColumnBuilder<'a> {
    components: &'a mut ComponentBag,
    index: usize,
}

impl ColumnBuilder<'_> {
    fn update(self, apply: impl FnOnce(&mut ColumnDefinition)) -> Self {
        if let Some(Component::CreateColumn(column)) = self.components.get_mut(self.index) {
            apply(column.definition_mut());
        }
        self
    }

    /// Allow NULL
    pub fn nullable(self) -> Self {
        self.update(|d| d.nullable = true)
    }

    /// Mark UNSIGNED
    pub fn unsigned(self) -> Self {
        self.update(|d| d.unsigned = true)
    }

    /// Mark auto-increment
    pub fn incremented(self) -> Self {
        self.update(|d| d.incremented = true)
    }

    /// Set the DEFAULT value
    pub fn default(self, value: impl Into<DatabaseValue>) -> Self {
        let value = value.into();
        self.update(|d| d.default = Some(value))
    }
}

/// Constraint names carry no spaces, and commas of a column list become `_`
fn constraint_name(name: &str) -> String {
    name.replace(' ', "").replace(',', "_")
}

impl Blueprint {
    /// Start a blueprint for `table`
    pub fn new(table: &str) -> Self {
        let mut components = ComponentBag::new();
        components.add(Component::Table(table.to_string()));
        Self {
            table: table.to_string(),
            components,
            bindings: Bindings::new(),
        }
    }

    /// Table this blueprint targets
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Recorded components
    pub fn components(&self) -> &ComponentBag {
        &self.components
    }

    fn create_column(&mut self, name: &str, column_type: ColumnType, length: u32, scale: u32) -> ColumnBuilder<'_> {
        let mut definition = ColumnDefinition::new(name, column_type);
        definition.length = length;
        definition.scale = scale;

        self.components
            .add(Component::CreateColumn(CreateColumn::Add(definition)));
        let index = self.components.len() - 1;

        ColumnBuilder {
            components: &mut self.components,
            index,
        }
    }

    pub fn integer(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Integer, 0, 0)
    }

    pub fn big_integer(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::BigInteger, 0, 0)
    }

    /// DECIMAL with `length` digits, `scale` of them after the point
    pub fn decimal(&mut self, name: &str, length: u32, scale: u32) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Decimal, length, scale)
    }

    /// VARCHAR of `length` characters
    pub fn string(&mut self, name: &str, length: u32) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::String, length, 0)
    }

    pub fn text(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Text, 0, 0)
    }

    pub fn date(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Date, 0, 0)
    }

    pub fn time(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Time, 0, 0)
    }

    pub fn date_time(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::DateTime, 0, 0)
    }

    pub fn timestamp(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Timestamp, 0, 0)
    }

    pub fn binary(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Binary, 0, 0)
    }

    pub fn boolean(&mut self, name: &str) -> ColumnBuilder<'_> {
        self.create_column(name, ColumnType::Boolean, 0, 0)
    }

    /// Redefine existing columns
    ///
    /// Columns declared inside `define` compile as column modifications
    /// instead of additions.
    pub fn modify<F>(&mut self, define: F)
    where
        F: FnOnce(&mut Blueprint),
    {
        let mut nested = Blueprint::new(&self.table);
        define(&mut nested);

        for component in nested.components {
            if let Component::CreateColumn(column) = component {
                self.components
                    .add(Component::CreateColumn(column.into_alter()));
            }
        }
    }

    /// Drop a column
    pub fn drop_column(&mut self, name: &str) {
        self.components.add(Component::DropColumn(name.to_string()));
    }

    fn create_constraint(
        &mut self,
        columns: &str,
        constraint_type: ConstraintType,
        name: &str,
        reference: Option<ForeignReference>,
    ) {
        self.components
            .add(Component::CreateConstraint(ConstraintDefinition {
                name: constraint_name(name),
                constraint_type,
                column: columns.to_string(),
                reference,
            }));
    }

    /// PRIMARY KEY named `<columns>_pk`
    pub fn primary(&mut self, columns: &str) {
        let name = format!("{}_pk", columns.to_lowercase());
        self.primary_named(columns, &name);
    }

    pub fn primary_named(&mut self, columns: &str, name: &str) {
        self.create_constraint(columns, ConstraintType::PrimaryKey, name, None);
    }

    /// UNIQUE named `<columns>_uq`
    pub fn unique(&mut self, columns: &str) {
        let name = format!("{}_uq", columns.to_lowercase());
        self.unique_named(columns, &name);
    }

    pub fn unique_named(&mut self, columns: &str, name: &str) {
        self.create_constraint(columns, ConstraintType::Unique, name, None);
    }

    /// INDEX named `<columns>_ix`
    pub fn index(&mut self, columns: &str) {
        let name = format!("{}_ix", columns.to_lowercase());
        self.index_named(columns, &name);
    }

    pub fn index_named(&mut self, columns: &str, name: &str) {
        self.create_constraint(columns, ConstraintType::Index, name, None);
    }

    /// FOREIGN KEY named `<table>_<related table>_fk`
    pub fn foreign(
        &mut self,
        column: &str,
        related_table: &str,
        related_column: &str,
        on_delete: &str,
        on_update: &str,
    ) {
        let name = format!("{}_{}_fk", self.table, related_table);
        self.foreign_named(column, &name, related_table, related_column, on_delete, on_update);
    }

    pub fn foreign_named(
        &mut self,
        column: &str,
        name: &str,
        related_table: &str,
        related_column: &str,
        on_delete: &str,
        on_update: &str,
    ) {
        let reference = ForeignReference {
            table: related_table.to_string(),
            column: related_column.to_string(),
            on_delete: on_delete.to_string(),
            on_update: on_update.to_string(),
        };
        self.create_constraint(column, ConstraintType::ForeignKey, name, Some(reference));
    }

    fn drop_constraint(&mut self, constraint_type: ConstraintType, name: &str) {
        self.components.add(Component::DropConstraint {
            constraint_type,
            name: name.to_string(),
        });
    }

    /// Drop the table's primary key
    pub fn drop_primary(&mut self) {
        self.drop_constraint(ConstraintType::PrimaryKey, "");
    }

    pub fn drop_unique(&mut self, name: &str) {
        self.drop_constraint(ConstraintType::Unique, name);
    }

    pub fn drop_index(&mut self, name: &str) {
        self.drop_constraint(ConstraintType::Index, name);
    }

    pub fn drop_foreign(&mut self, name: &str) {
        self.drop_constraint(ConstraintType::ForeignKey, name);
    }

    /// View as CREATE TABLE
    pub fn to_create(&self) -> Compilable<'_> {
        Compilable::new(StatementKind::Create, &self.components, &self.bindings)
    }

    /// View as ALTER TABLE
    pub fn to_alter(&self) -> Compilable<'_> {
        Compilable::new(StatementKind::Alter, &self.components, &self.bindings)
    }

    /// View as DROP TABLE
    pub fn to_drop(&self) -> Compilable<'_> {
        Compilable::new(StatementKind::Drop, &self.components, &self.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{ComponentKind, GenericSchemaGrammar, Grammar};

    fn compile(compilable: &Compilable<'_>) -> String {
        GenericSchemaGrammar.compile(compilable).unwrap()
    }

    #[test]
    fn test_column_modifiers() {
        let mut table = Blueprint::new("items");
        table.decimal("price", 8, 2).unsigned().nullable().default(0);
        table.boolean("active").default(true);
        table.timestamp("seen").nullable();

        let columns = table.components().create_columns();
        let price = columns[0].definition();
        assert_eq!((price.length, price.scale), (8, 2));
        assert!(price.unsigned && price.nullable);
        assert_eq!(price.default, Some(DatabaseValue::Int(0)));

        assert_eq!(
            compile(&table.to_create()),
            "CREATE TABLE items ( price DECIMAL (8,2) UNSIGNED NULL DEFAULT '0',\
             active BOOLEAN NOT NULL DEFAULT '1',seen TIMESTAMP NULL );"
        );
    }

    #[test]
    fn test_drop_then_add_column() {
        let mut table = Blueprint::new("t");
        table.drop_column("x");
        table.integer("y");

        assert_eq!(
            compile(&table.to_alter()),
            "ALTER TABLE t DROP COLUMN x ; ALTER TABLE t ADD y INTEGER NOT NULL ;"
        );
    }

    #[test]
    fn test_modify_marks_columns_as_alter() {
        let mut table = Blueprint::new("t");
        table.modify(|t| {
            t.string("name", 200).nullable();
            t.primary("ignored");
        });

        assert_eq!(table.components().all(ComponentKind::AlterColumn).len(), 1);
        assert!(!table.components().contains(ComponentKind::CreateConstraint));
        assert_eq!(
            compile(&table.to_alter()),
            "ALTER TABLE t MODIFY COLUMN name VARCHAR (200) NULL ;"
        );
    }

    #[test]
    fn test_default_constraint_names() {
        let mut table = Blueprint::new("posts");
        table.primary("ID");
        table.unique("slug, lang");
        table.index("created_at");
        table.foreign("user_id", "users", "id", "CASCADE", "CASCADE");
        table.unique_named("a", "my name");

        let names: Vec<_> = table
            .components()
            .create_constraints()
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["id_pk", "slug_lang_uq", "created_at_ix", "posts_users_fk", "myname"]
        );
    }

    #[test]
    fn test_drop_constraints() {
        let mut table = Blueprint::new("t");
        table.drop_primary();
        table.drop_unique("a_uq");
        table.drop_index("b_ix");
        table.drop_foreign("t_u_fk");

        assert_eq!(
            compile(&table.to_alter()),
            "ALTER TABLE t DROP PRIMARY KEY ; ALTER TABLE t DROP UNIQUE a_uq ; \
             ALTER TABLE t DROP INDEX b_ix ; ALTER TABLE t DROP FOREIGN KEY t_u_fk ;"
        );
    }

    #[test]
    fn test_drop_table() {
        let table = Blueprint::new("t");
        assert_eq!(compile(&table.to_drop()), "DROP TABLE t ;");
    }
}
