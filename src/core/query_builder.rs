//! Fluent statement builder
//!
//! A [`Query`] records clauses as components and their operands as bindings.
//! Clause methods consume and return the builder. A statement is only
//! produced by one of the finishing calls ([`Query::to_select`],
//! [`Query::to_insert`], [`Query::to_update`], [`Query::to_delete`]) or by a
//! terminal call that executes it.
//!
//! ```
//! use rust_database_layer::core::query_builder::Query;
//! use rust_database_layer::grammar::{GenericQueryGrammar, Grammar};
//!
//! let query = Query::new().table("t").r#where("a", "=", 1).r#where("b", "=", 2);
//! let sql = GenericQueryGrammar.compile(&query.to_select()).unwrap();
//!
//! assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND b = ?");
//! ```

use super::error::{DatabaseError, Result};
use super::handler::Handler;
use super::value::{values, Affecting, DatabaseValue, Row, RowList};
use crate::grammar::{
    BindingCategory, Bindings, Compilable, Component, ComponentBag, ComponentKind, Condition,
    JoinComponent, JoinType, StatementKind,
};

/// Query statement builder
#[derive(Clone)]
pub struct Query<'a> {
    handler: Option<Handler<'a>>,
    components: ComponentBag,
    bindings: Bindings,
}

impl Default for Query<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("attached", &self.handler.is_some())
            .field("components", &self.components)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl<'a> Query<'a> {
    /// Create a builder that can only be compiled, not executed
    pub fn new() -> Self {
        Self {
            handler: None,
            components: ComponentBag::new(),
            bindings: Bindings::new(),
        }
    }

    /// Create a builder whose terminal calls run through `handler`
    pub fn with_handler(handler: Handler<'a>) -> Self {
        Self {
            handler: Some(handler),
            ..Self::new()
        }
    }

    /// Recorded components
    pub fn components(&self) -> &ComponentBag {
        &self.components
    }

    /// Recorded bindings
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Set the table, replacing any previous one
    #[must_use]
    pub fn table(mut self, table: &str) -> Self {
        self.components.remove_all(ComponentKind::Table);
        self.components.add(Component::Table(table.to_string()));
        self
    }

    /// Alias of [`Query::table`]
    #[must_use]
    pub fn from(self, table: &str) -> Self {
        self.table(table)
    }

    /// Toggle SELECT DISTINCT
    #[must_use]
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.components.remove_all(ComponentKind::Distinct);
        self.components.add(Component::Distinct(distinct));
        self
    }

    /// Add columns from a comma separated list
    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.components.add(Component::Column(columns.to_string()));
        self
    }

    /// Column set and rows of a DML statement, replacing earlier ones
    fn replace_columns(mut self, columns: &str) -> Self {
        self.components.remove_all(ComponentKind::Column);
        self.bindings.remove(BindingCategory::Values);
        self.select(columns)
    }

    /// Alias of [`Query::select`]
    #[must_use]
    pub fn column(self, columns: &str) -> Self {
        self.select(columns)
    }

    /// Join `table` with a chain built by `build`
    ///
    /// ```
    /// use rust_database_layer::core::query_builder::Query;
    /// use rust_database_layer::grammar::{GenericQueryGrammar, Grammar, JoinType};
    ///
    /// let query = Query::new().table("users u").join_with(JoinType::Left, "posts p", |join| {
    ///     join.on("p.user_id", "=", "u.id").or_on("p.editor_id", "=", "u.id")
    /// });
    /// let sql = GenericQueryGrammar.compile(&query.to_select()).unwrap();
    ///
    /// assert_eq!(
    ///     sql,
    ///     "SELECT * FROM users u LEFT JOIN posts p ON p.user_id = u.id OR p.editor_id = u.id"
    /// );
    /// ```
    #[must_use]
    pub fn join_with<F>(mut self, join_type: JoinType, table: &str, build: F) -> Self
    where
        F: FnOnce(JoinComponent) -> JoinComponent,
    {
        let join = build(JoinComponent::new(join_type, table));
        self.components.add(Component::Join(join));
        self
    }

    /// INNER JOIN on a single comparison
    #[must_use]
    pub fn join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.join_with(JoinType::Inner, table, |j| j.on(first, operator, second))
    }

    /// LEFT JOIN on a single comparison
    #[must_use]
    pub fn left_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.join_with(JoinType::Left, table, |j| j.on(first, operator, second))
    }

    /// RIGHT JOIN on a single comparison
    #[must_use]
    pub fn right_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.join_with(JoinType::Right, table, |j| j.on(first, operator, second))
    }

    /// FULL JOIN on a single comparison
    #[must_use]
    pub fn full_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.join_with(JoinType::Full, table, |j| j.on(first, operator, second))
    }

    /// NATURAL JOIN on a single comparison
    #[must_use]
    pub fn natural_join(self, table: &str, first: &str, operator: &str, second: &str) -> Self {
        self.join_with(JoinType::Natural, table, |j| j.on(first, operator, second))
    }

    fn condition(
        mut self,
        category: BindingCategory,
        column: &str,
        operator: &str,
        value: Option<DatabaseValue>,
        or: bool,
    ) -> Self {
        if let Some(value) = &value {
            self.bindings.set(category, value.clone());
        }

        let condition = Condition::new(column, operator, value, or);
        self.components.add(match category {
            BindingCategory::Havings => Component::Having(condition),
            _ => Component::Where(condition),
        });
        self
    }

    /// Add a WHERE condition chained with AND
    #[must_use]
    pub fn r#where(self, column: &str, operator: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(BindingCategory::Wheres, column, operator, Some(value.into()), false)
    }

    /// Add a WHERE condition chained with OR
    #[must_use]
    pub fn or_where(self, column: &str, operator: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(BindingCategory::Wheres, column, operator, Some(value.into()), true)
    }

    /// `column = value`
    #[must_use]
    pub fn where_eq(self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        self.r#where(column, "=", value)
    }

    /// `column IN (...)`
    ///
    /// An empty list fails at compilation.
    #[must_use]
    pub fn where_in<I, T>(self, column: &str, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DatabaseValue>,
    {
        self.r#where(column, "IN", values(items))
    }

    /// `column IS NULL`
    #[must_use]
    pub fn where_null(self, column: &str) -> Self {
        self.condition(BindingCategory::Wheres, column, "IS NULL", None, false)
    }

    /// `column IS NOT NULL`
    #[must_use]
    pub fn where_not_null(self, column: &str) -> Self {
        self.condition(BindingCategory::Wheres, column, "IS NOT NULL", None, false)
    }

    /// Add a HAVING condition chained with AND
    #[must_use]
    pub fn having(self, column: &str, operator: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(BindingCategory::Havings, column, operator, Some(value.into()), false)
    }

    /// Add a HAVING condition chained with OR
    #[must_use]
    pub fn or_having(self, column: &str, operator: &str, value: impl Into<DatabaseValue>) -> Self {
        self.condition(BindingCategory::Havings, column, operator, Some(value.into()), true)
    }

    /// Add GROUP BY columns
    #[must_use]
    pub fn group(mut self, columns: &str) -> Self {
        self.components.add(Component::Group(columns.to_string()));
        self
    }

    /// Add an ORDER BY column
    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.components.add(Component::Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Add an ascending ORDER BY column
    #[must_use]
    pub fn order_asc(self, column: &str) -> Self {
        self.order(column, true)
    }

    /// Add a descending ORDER BY column
    #[must_use]
    pub fn order_desc(self, column: &str) -> Self {
        self.order(column, false)
    }

    /// Set LIMIT, replacing any previous one
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.components.remove_all(ComponentKind::Limit);
        self.components.add(Component::Limit(limit));
        self
    }

    /// Set OFFSET, replacing any previous one
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.components.remove_all(ComponentKind::Offset);
        self.components.add(Component::Offset(offset));
        self
    }

    /// Bind one row of values for INSERT, or the assignments of an UPDATE
    ///
    /// A scalar is treated as a one-column row.
    #[must_use]
    pub fn row(mut self, row: impl Into<DatabaseValue>) -> Self {
        self.bindings.set(BindingCategory::Values, row.into());
        self
    }

    /// View as a SELECT
    pub fn to_select(&self) -> Compilable<'_> {
        Compilable::new(StatementKind::Select, &self.components, &self.bindings)
    }

    /// View as an INSERT of the bound rows
    pub fn to_insert(&self) -> Compilable<'_> {
        Compilable::new(StatementKind::Insert, &self.components, &self.bindings)
    }

    /// View as an UPDATE assigning the bound values
    pub fn to_update(&self) -> Compilable<'_> {
        Compilable::new(StatementKind::Update, &self.components, &self.bindings)
    }

    /// View as a DELETE
    pub fn to_delete(&self) -> Compilable<'_> {
        Compilable::new(StatementKind::Delete, &self.components, &self.bindings)
    }

    fn handler(&self) -> Result<Handler<'a>> {
        self.handler
            .ok_or_else(|| DatabaseError::NotConnected("detached query".to_string()))
    }

    /// Run as SELECT
    pub async fn get(&self) -> Result<RowList> {
        self.handler()?.fetch(&self.to_select()).await
    }

    /// Run as SELECT limited to one row
    ///
    /// The builder's own limit is restored afterwards.
    pub async fn first(&mut self) -> Result<Option<Row>> {
        let previous = self.components.limit();
        self.components.remove_all(ComponentKind::Limit);
        self.components.add(Component::Limit(1));

        let result = self.get().await;

        self.components.remove_all(ComponentKind::Limit);
        if let Some(limit) = previous {
            self.components.add(Component::Limit(limit));
        }

        Ok(result?.into_iter().next())
    }

    /// Insert one row into `columns`
    pub async fn insert(self, columns: &str, row: impl Into<DatabaseValue>) -> Result<Affecting> {
        let query = self.replace_columns(columns).row(row);
        query.handler()?.affect(&query.to_insert()).await
    }

    /// Insert several rows into `columns`
    pub async fn insert_rows<I, R>(self, columns: &str, rows: I) -> Result<Affecting>
    where
        I: IntoIterator<Item = R>,
        R: Into<DatabaseValue>,
    {
        let mut query = self.replace_columns(columns);
        for row in rows {
            query = query.row(row);
        }
        query.handler()?.affect(&query.to_insert()).await
    }

    /// Assign `row` to `columns` on every matching row
    pub async fn update(self, columns: &str, row: impl Into<DatabaseValue>) -> Result<Affecting> {
        let query = self.replace_columns(columns).row(row);
        query.handler()?.affect(&query.to_update()).await
    }

    /// Delete every matching row
    pub async fn delete(self) -> Result<Affecting> {
        self.handler()?.affect(&self.to_delete()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::link::testing::RecordingLink;
    use crate::core::transform::DefaultTransform;
    use crate::grammar::{GenericQueryGrammar, Grammar};

    fn sql(compilable: &Compilable<'_>) -> String {
        GenericQueryGrammar.compile(compilable).unwrap()
    }

    #[test]
    fn test_where_chain_and_bindings() {
        let query = Query::new().table("t").r#where("a", "=", 1).r#where("b", "=", 2);

        assert_eq!(sql(&query.to_select()), "SELECT * FROM t WHERE a = ? AND b = ?");
        assert_eq!(query.to_select().parameters(), vec![1.into(), 2.into()]);
    }

    #[test]
    fn test_replacing_clauses() {
        let query = Query::new()
            .table("a")
            .table("b")
            .limit(5)
            .limit(10)
            .offset(1)
            .offset(2)
            .distinct(true)
            .distinct(false);

        assert_eq!(sql(&query.to_select()), "SELECT * FROM b LIMIT 10 OFFSET 2");
    }

    #[test]
    fn test_accumulating_clauses() {
        let query = Query::new()
            .from("orders")
            .select("customer")
            .column("SUM(total) AS total")
            .where_in("status", ["paid", "sent"])
            .or_where("vip", "=", true)
            .where_not_null("customer")
            .group("customer")
            .having("SUM(total)", ">", 100)
            .or_having("COUNT(*)", ">", 3)
            .order_desc("total")
            .order_asc("customer");

        assert_eq!(
            sql(&query.to_select()),
            "SELECT customer,SUM(total) AS total FROM orders \
             WHERE status IN (?,?) OR vip = ? AND customer IS NOT NULL \
             GROUP BY customer HAVING SUM(total) > ? OR COUNT(*) > ? \
             ORDER BY total DESC,customer ASC"
        );
        assert_eq!(
            query.to_select().parameters(),
            vec!["paid".into(), "sent".into(), true.into(), 100.into(), 3.into()]
        );
    }

    #[test]
    fn test_join_variants() {
        let query = Query::new()
            .table("a")
            .join("b", "a.id", "=", "b.a_id")
            .right_join("c", "a.id", "=", "c.a_id")
            .full_join("d", "a.id", "=", "d.a_id")
            .natural_join("e", "a.id", "=", "e.a_id");

        assert_eq!(
            sql(&query.to_select()),
            "SELECT * FROM a INNER JOIN b ON a.id = b.a_id RIGHT JOIN c ON a.id = c.a_id \
             FULL JOIN d ON a.id = d.a_id NATURAL JOIN e ON a.id = e.a_id"
        );
    }

    #[test]
    fn test_update_and_delete_views() {
        let query = Query::new()
            .table("t")
            .where_eq("id", 3)
            .select("a,b")
            .row(values(["x", "y"]));

        assert_eq!(sql(&query.to_update()), "UPDATE t SET a = ?,b = ? WHERE id = ?");
        assert_eq!(
            query.to_update().parameters(),
            vec!["x".into(), "y".into(), 3.into()]
        );
        assert_eq!(sql(&query.to_delete()), "DELETE FROM t WHERE id = ?");
    }

    #[test]
    fn test_compilation_is_repeatable() {
        let query = Query::new().table("t").where_in("id", [1, 2]).limit(3);
        let first = sql(&query.to_select());
        let second = sql(&query.to_select());
        assert_eq!(first, second);
        assert_eq!(query.to_select().parameters(), query.to_select().parameters());
    }

    #[tokio::test]
    async fn test_detached_query_cannot_run() {
        let err = Query::new().table("t").get().await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotConnected(_)));
    }

    #[tokio::test]
    async fn test_first_restores_limit() {
        let mut rows = RowList::new();
        let mut row = Row::new();
        row.set("id", 1.into());
        rows.push(row);

        let link = RecordingLink::with_rows(rows);
        let handler = Handler::new(&GenericQueryGrammar, &link, &DefaultTransform);

        let mut query = Query::with_handler(handler).table("t").limit(50);
        let first = query.first().await.unwrap().unwrap();
        assert_eq!(first.get("ID"), Some(&DatabaseValue::Int(1)));
        assert_eq!(query.components().limit(), Some(50));

        let mut unlimited = Query::with_handler(handler).table("t");
        unlimited.first().await.unwrap();
        assert_eq!(unlimited.components().limit(), None);

        let calls = link.calls();
        assert_eq!(calls[0].1, "SELECT * FROM t LIMIT 1");
        assert_eq!(calls[1].1, "SELECT * FROM t LIMIT 1");
    }

    #[tokio::test]
    async fn test_terminal_dml_calls() {
        let link = RecordingLink::default();
        let handler = Handler::new(&GenericQueryGrammar, &link, &DefaultTransform);

        let inserted = Query::with_handler(handler)
            .table("t")
            .insert("a,b", values([1, 2]))
            .await
            .unwrap();
        assert!(inserted.success());

        Query::with_handler(handler)
            .table("t")
            .insert_rows("a,b", [values([1, 2]), values([3, 4])])
            .await
            .unwrap();

        Query::with_handler(handler)
            .table("t")
            .where_eq("id", 1)
            .update("a", "z")
            .await
            .unwrap();

        let deleted = Query::with_handler(handler)
            .table("t")
            .where_eq("id", 1)
            .delete()
            .await
            .unwrap();
        assert!(deleted.fails());

        let calls = link.calls();
        assert_eq!(calls[0].1, "INSERT INTO t (a,b) VALUES (?,?)");
        assert_eq!(calls[1].1, "INSERT INTO t (a,b) VALUES (?,?),(?,?)");
        assert_eq!(calls[1].2.len(), 4);
        assert_eq!(calls[2].1, "UPDATE t SET a = ? WHERE id = ?");
        assert_eq!(calls[2].2, vec!["z".into(), 1.into()]);
        assert_eq!(calls[3].0, "delete");
    }

    #[tokio::test]
    async fn test_empty_where_in_stops_before_link() {
        let link = RecordingLink::default();
        let handler = Handler::new(&GenericQueryGrammar, &link, &DefaultTransform);

        let err = Query::with_handler(handler)
            .table("t")
            .where_in("id", Vec::<i64>::new())
            .get()
            .await
            .unwrap_err();
        assert!(err.is_compilation());

        let err = Query::with_handler(handler)
            .table("t")
            .where_in("id", Vec::<i64>::new())
            .update("a", 1)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Compilation error: Empty value list for id");
        assert!(link.calls().is_empty());
    }

    #[tokio::test]
    async fn test_insert_arity_error_stops_before_link() {
        let link = RecordingLink::default();
        let handler = Handler::new(&GenericQueryGrammar, &link, &DefaultTransform);

        let err = Query::with_handler(handler)
            .table("t")
            .insert_rows("a,b", [values([1, 2]), values([3])])
            .await
            .unwrap_err();

        assert!(err.to_string().ends_with("at row 2"));
        assert!(link.calls().is_empty());
    }
}
