//! SELECT, INSERT, UPDATE and DELETE compilation
//!
//! [`QueryGrammar`] holds one default method per clause. The defaults render
//! the generic dialect; a dialect overrides the fragments it spells
//! differently and inherits the statement assembly.

use super::{
    glue, split, BindingCategory, Bindings, ComponentBag, Condition, Grammar, JoinType,
    StatementKind,
};
use crate::core::error::{DatabaseError, Result};
use crate::core::value::DatabaseValue;

/// Query statement compiler
pub trait QueryGrammar: Grammar {
    /// Comparison operator as written in SQL
    fn operator(&self, operator: &str) -> String {
        operator.to_string()
    }

    /// Placeholder for a bound operand
    ///
    /// A scalar renders `?`, an array renders a parenthesised group sized to
    /// the array, and a missing operand renders nothing.
    fn placeholder(&self, value: Option<&DatabaseValue>) -> String {
        match value {
            None => String::new(),
            Some(DatabaseValue::Array(items)) => placeholder_group(items.len()),
            Some(_) => "?".to_string(),
        }
    }

    /// Keyword preceding `JOIN`
    fn join_type(&self, join_type: JoinType) -> String {
        join_type.keyword().to_string()
    }

    fn compile_table(&self, components: &ComponentBag) -> Result<String> {
        components
            .table()
            .map(|table| self.escape(table))
            .ok_or_else(|| DatabaseError::compilation("Undefined table"))
    }

    fn compile_distinct(&self, components: &ComponentBag) -> String {
        if components.distinct() {
            "DISTINCT".to_string()
        } else {
            String::new()
        }
    }

    fn compile_columns(&self, components: &ComponentBag) -> String {
        let columns: Vec<String> = components
            .columns()
            .into_iter()
            .map(|list| self.escape(list))
            .filter(|list| !list.is_empty())
            .collect();

        if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(",")
        }
    }

    fn compile_joins(&self, components: &ComponentBag) -> String {
        let mut joins = Vec::new();

        for join in components.joins() {
            if join.clauses.is_empty() {
                continue;
            }

            let mut rendered = format!(
                "{} JOIN {}",
                self.join_type(join.join_type),
                self.escape(&join.table)
            );
            for (index, clause) in join.clauses.iter().enumerate() {
                let keyword = match (index, clause.or) {
                    (0, _) => "ON",
                    (_, true) => "OR",
                    (_, false) => "AND",
                };
                rendered.push_str(&format!(
                    " {} {} {} {}",
                    keyword,
                    self.escape(&clause.first),
                    self.operator(&clause.operator),
                    self.escape(&clause.second)
                ));
            }
            joins.push(rendered);
        }

        joins.join(" ")
    }

    /// Chain conditions under `keyword`, or nothing when there are none
    fn compile_conditions(&self, keyword: &str, conditions: &[&Condition]) -> String {
        if conditions.is_empty() {
            return String::new();
        }

        let mut rendered = String::new();
        for (index, condition) in conditions.iter().enumerate() {
            if index > 0 {
                rendered.push_str(if condition.or { " OR " } else { " AND " });
            }
            rendered.push_str(&glue(&[
                &self.escape(&condition.column),
                &self.operator(&condition.operator),
                &self.placeholder(condition.value.as_ref()),
            ]));
        }

        format!("{} {}", keyword, rendered)
    }

    fn compile_wheres(&self, components: &ComponentBag) -> String {
        self.compile_conditions("WHERE", &components.wheres())
    }

    fn compile_havings(&self, components: &ComponentBag) -> String {
        self.compile_conditions("HAVING", &components.havings())
    }

    fn compile_groups(&self, components: &ComponentBag) -> String {
        let groups = components.groups();
        if groups.is_empty() {
            return String::new();
        }

        format!("GROUP BY {}", self.escape(&groups.join(",")))
    }

    fn compile_orders(&self, components: &ComponentBag) -> String {
        let orders = components.orders();
        if orders.is_empty() {
            return String::new();
        }

        let rendered: Vec<String> = orders
            .into_iter()
            .map(|(column, ascending)| {
                format!(
                    "{} {}",
                    self.escape(column),
                    if ascending { "ASC" } else { "DESC" }
                )
            })
            .collect();

        format!("ORDER BY {}", rendered.join(","))
    }

    fn compile_limit(&self, components: &ComponentBag) -> String {
        components
            .limit()
            .map(|limit| format!("LIMIT {}", limit))
            .unwrap_or_default()
    }

    fn compile_offset(&self, components: &ComponentBag) -> String {
        components
            .offset()
            .map(|offset| format!("OFFSET {}", offset))
            .unwrap_or_default()
    }

    fn compile_select(&self, components: &ComponentBag) -> Result<String> {
        if components.offset().is_some() && components.limit().is_none() {
            return Err(DatabaseError::compilation(
                "Can't create offset without limit",
            ));
        }

        let table = self.compile_table(components)?;

        Ok(glue(&[
            "SELECT",
            &self.compile_distinct(components),
            &self.compile_columns(components),
            "FROM",
            &table,
            &self.compile_joins(components),
            &self.compile_wheres(components),
            &self.compile_groups(components),
            &self.compile_havings(components),
            &self.compile_orders(components),
            &self.compile_limit(components),
            &self.compile_offset(components),
        ]))
    }

    /// Insert of a single row made only of column defaults
    fn compile_empty_insert(&self, table: &str) -> String {
        glue(&["INSERT INTO", table, "() VALUES ()"])
    }

    fn compile_insert(&self, components: &ComponentBag, bindings: &Bindings) -> Result<String> {
        let table = self.compile_table(components)?;
        let columns: Vec<String> = components
            .columns()
            .into_iter()
            .flat_map(split)
            .map(|column| self.wrap(column))
            .collect();

        let rows = bindings.get(BindingCategory::Values);
        if rows.is_empty() {
            return Ok(self.compile_empty_insert(&table));
        }

        let mut groups = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let arity = row.as_array().map_or(1, <[DatabaseValue]>::len);
            if arity != columns.len() {
                return Err(DatabaseError::compilation(format!(
                    "Value count not match column count at row {}",
                    index + 1
                )));
            }
            groups.push(placeholder_group(columns.len()));
        }

        Ok(glue(&[
            "INSERT INTO",
            &table,
            &format!("({})", columns.join(",")),
            "VALUES",
            &groups.join(","),
        ]))
    }

    fn compile_update(&self, components: &ComponentBag, bindings: &Bindings) -> Result<String> {
        let columns: Vec<&str> = components.columns().into_iter().flat_map(split).collect();
        if columns.is_empty() {
            return Err(DatabaseError::compilation("Undefined columns in update"));
        }

        let values = bindings.get_array(&[BindingCategory::Values]);
        if values.is_empty() {
            return Err(DatabaseError::compilation("Undefined values in update"));
        }

        let table = self.compile_table(components)?;
        if columns.len() != values.len() {
            return Err(DatabaseError::compilation(
                "Value count not match column count",
            ));
        }

        let assignments: Vec<String> = columns
            .iter()
            .map(|column| format!("{} = ?", self.wrap(column)))
            .collect();

        Ok(glue(&[
            "UPDATE",
            &table,
            &format!("SET {}", assignments.join(",")),
            &self.compile_wheres(components),
        ]))
    }

    fn compile_delete(&self, components: &ComponentBag) -> Result<String> {
        let table = self.compile_table(components)?;
        Ok(glue(&["DELETE FROM", &table, &self.compile_wheres(components)]))
    }

    /// Reject conditions bound to an empty value list
    fn check_operands(&self, components: &ComponentBag) -> Result<()> {
        let empty = components
            .wheres()
            .into_iter()
            .chain(components.havings())
            .find(|c| matches!(&c.value, Some(DatabaseValue::Array(items)) if items.is_empty()));

        match empty {
            Some(condition) => Err(DatabaseError::compilation(format!(
                "Empty value list for {}",
                condition.column
            ))),
            None => Ok(()),
        }
    }

    /// Dispatch on statement kind; schema kinds are not handled here
    fn compile_query(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        bindings: &Bindings,
    ) -> Result<Option<String>> {
        if matches!(
            kind,
            StatementKind::Select | StatementKind::Update | StatementKind::Delete
        ) {
            self.check_operands(components)?;
        }

        let sql = match kind {
            StatementKind::Select => self.compile_select(components)?,
            StatementKind::Insert => self.compile_insert(components, bindings)?,
            StatementKind::Update => self.compile_update(components, bindings)?,
            StatementKind::Delete => self.compile_delete(components)?,
            _ => return Ok(None),
        };
        Ok(Some(sql))
    }
}

/// `(?,?,...)` with `size` placeholders
pub(crate) fn placeholder_group(size: usize) -> String {
    format!("({})", vec!["?"; size].join(","))
}

/// Generic query dialect: identifiers are left unquoted
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericQueryGrammar;

impl Grammar for GenericQueryGrammar {
    fn compile_statement(
        &self,
        kind: StatementKind,
        components: &ComponentBag,
        bindings: &Bindings,
    ) -> Result<Option<String>> {
        self.compile_query(kind, components, bindings)
    }
}

impl QueryGrammar for GenericQueryGrammar {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::values;
    use crate::grammar::{Compilable, Component, JoinComponent};

    fn bag(components: Vec<Component>) -> ComponentBag {
        let mut bag = ComponentBag::new();
        for component in components {
            bag.add(component);
        }
        bag
    }

    fn condition(column: &str, operator: &str, value: Option<DatabaseValue>, or: bool) -> Component {
        Component::Where(Condition::new(column, operator, value, or))
    }

    fn compile(kind: StatementKind, bag: &ComponentBag, bindings: &Bindings) -> Result<String> {
        GenericQueryGrammar.compile(&Compilable::new(kind, bag, bindings))
    }

    #[test]
    fn test_select_defaults_to_all_columns() {
        let bag = bag(vec![Component::Table("users".into())]);
        let sql = compile(StatementKind::Select, &bag, &Bindings::new()).unwrap();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_select_with_chained_wheres() {
        let bag = bag(vec![
            Component::Table("t".into()),
            condition("a", "=", Some(1.into()), false),
            condition("b", "=", Some(2.into()), false),
            condition("c", "IS NULL", None, true),
        ]);
        let sql = compile(StatementKind::Select, &bag, &Bindings::new()).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND b = ? OR c IS NULL");
    }

    #[test]
    fn test_select_full_clause_order() {
        let bag = bag(vec![
            Component::Distinct(true),
            Component::Column("u.id, u.name AS username".into()),
            Component::Table("users u".into()),
            Component::Join(
                JoinComponent::new(JoinType::Left, "posts p")
                    .on("p.user_id", "=", "u.id")
                    .or_on("p.editor_id", "=", "u.id"),
            ),
            Component::Join(JoinComponent::new(JoinType::Inner, "ignored")),
            condition("u.id", "IN", Some(values([1, 2, 3])), false),
            Component::Group("u.id".into()),
            Component::Having(Condition::new("u.id", ">", Some(0.into()), false)),
            Component::Order {
                column: "u.name".into(),
                ascending: false,
            },
            Component::Limit(10),
            Component::Offset(20),
        ]);

        let sql = compile(StatementKind::Select, &bag, &Bindings::new()).unwrap();
        assert_eq!(
            sql,
            "SELECT DISTINCT u.id,u.name AS username FROM users u \
             LEFT JOIN posts p ON p.user_id = u.id OR p.editor_id = u.id \
             WHERE u.id IN (?,?,?) GROUP BY u.id HAVING u.id > ? \
             ORDER BY u.name DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_offset_without_limit_fails() {
        let bag = bag(vec![Component::Table("t".into()), Component::Offset(5)]);
        let err = compile(StatementKind::Select, &bag, &Bindings::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Compilation error: Can't create offset without limit"
        );
    }

    #[test]
    fn test_missing_table_fails() {
        let err = compile(StatementKind::Delete, &ComponentBag::new(), &Bindings::new()).unwrap_err();
        assert!(err.is_compilation());
        assert!(err.to_string().contains("Undefined table"));
    }

    #[test]
    fn test_insert_rows() {
        let bag = bag(vec![
            Component::Table("t".into()),
            Component::Column("a,b".into()),
        ]);
        let mut bindings = Bindings::new();
        bindings.set(BindingCategory::Values, values([1, 2]));
        bindings.set(BindingCategory::Values, values([3, 4]));

        let sql = compile(StatementKind::Insert, &bag, &bindings).unwrap();
        assert_eq!(sql, "INSERT INTO t (a,b) VALUES (?,?),(?,?)");
    }

    #[test]
    fn test_insert_arity_error_names_row() {
        let bag = bag(vec![
            Component::Table("t".into()),
            Component::Column("a,b".into()),
        ]);
        let mut bindings = Bindings::new();
        bindings.set(BindingCategory::Values, values([1, 2]));
        bindings.set(BindingCategory::Values, values([3]));

        let err = compile(StatementKind::Insert, &bag, &bindings).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Compilation error: Value count not match column count at row 2"
        );
    }

    #[test]
    fn test_empty_insert() {
        let bag = bag(vec![Component::Table("t".into())]);
        let sql = compile(StatementKind::Insert, &bag, &Bindings::new()).unwrap();
        assert_eq!(sql, "INSERT INTO t () VALUES ()");
    }

    #[test]
    fn test_update() {
        let bag = bag(vec![
            Component::Table("t".into()),
            Component::Column("a, b".into()),
            condition("id", "=", Some(7.into()), false),
        ]);
        let mut bindings = Bindings::new();
        bindings.set(BindingCategory::Values, values(["x", "y"]));
        bindings.set(BindingCategory::Wheres, 7.into());

        let sql = compile(StatementKind::Update, &bag, &bindings).unwrap();
        assert_eq!(sql, "UPDATE t SET a = ?,b = ? WHERE id = ?");
    }

    #[test]
    fn test_update_errors() {
        let table_only = bag(vec![Component::Table("t".into())]);
        let err = compile(StatementKind::Update, &table_only, &Bindings::new()).unwrap_err();
        assert!(err.to_string().contains("Undefined columns in update"));

        let with_columns = bag(vec![
            Component::Table("t".into()),
            Component::Column("a,b".into()),
        ]);
        let err = compile(StatementKind::Update, &with_columns, &Bindings::new()).unwrap_err();
        assert!(err.to_string().contains("Undefined values in update"));

        let mut bindings = Bindings::new();
        bindings.set(BindingCategory::Values, 1.into());
        let err = compile(StatementKind::Update, &with_columns, &bindings).unwrap_err();
        assert!(err.to_string().contains("Value count not match column count"));
    }

    #[test]
    fn test_delete() {
        let bag = bag(vec![
            Component::Table("t".into()),
            condition("id", "<", Some(3.into()), false),
        ]);
        let sql = compile(StatementKind::Delete, &bag, &Bindings::new()).unwrap();
        assert_eq!(sql, "DELETE FROM t WHERE id < ?");
    }

    #[test]
    fn test_empty_value_list_fails() {
        let empty = || Some(DatabaseValue::Array(Vec::new()));
        let wheres = bag(vec![
            Component::Table("t".into()),
            condition("id", "IN", empty(), false),
        ]);
        for kind in [StatementKind::Select, StatementKind::Delete] {
            let err = compile(kind, &wheres, &Bindings::new()).unwrap_err();
            assert_eq!(err.to_string(), "Compilation error: Empty value list for id");
        }

        let havings = bag(vec![
            Component::Table("t".into()),
            Component::Having(Condition::new("kind", "NOT IN", empty(), false)),
        ]);
        let err = compile(StatementKind::Select, &havings, &Bindings::new()).unwrap_err();
        assert!(err.is_compilation());
    }

    #[test]
    fn test_schema_kinds_are_unsupported() {
        let bag = bag(vec![Component::Table("t".into())]);
        let err = compile(StatementKind::Create, &bag, &Bindings::new()).unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedStatement(_)));
    }
}
