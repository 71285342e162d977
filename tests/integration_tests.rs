//! Integration tests for the database layer
//!
//! These tests drive the builders end to end against in-memory SQLite:
//! - Query and blueprint statements
//! - Concurrent access through one database
//! - Migrations through a registry
//! - Errors raised before execution

#[cfg(feature = "sqlite")]
mod sqlite_tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_database_layer::backends::sqlite::sqlite_support;
    use rust_database_layer::core::{
        values, Configuration, Database, DatabaseConfig, DatabaseError, DatabaseType,
        DatabaseValue, Migration, MigrationStatus, Migrator, Registry, Result,
    };
    use std::sync::Arc;

    async fn open_database() -> Database {
        let config = DatabaseConfig::new("main", DatabaseType::Sqlite);
        let mut db = Database::new(config, sqlite_support());
        db.open().await.expect("Failed to open database");
        db
    }

    async fn create_users(db: &Database) {
        db.create("users", |t| {
            t.integer("id");
            t.string("name", 100);
            t.boolean("active").nullable();
            t.decimal("balance", 10, 2).nullable();
            t.date_time("created_at").nullable();
            t.primary("id");
            t.index("name");
        })
        .await
        .expect("Failed to create table");
    }

    fn user(name: &str, active: bool) -> DatabaseValue {
        vec![DatabaseValue::from(name), DatabaseValue::from(active)].into()
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let db = open_database().await;
        create_users(&db).await;
        assert!(db.exists("users").await.unwrap());

        let balance = Decimal::new(1050, 2);
        let inserted = db
            .insert(
                "users",
                "name,active,balance",
                vec![
                    DatabaseValue::from("alice"),
                    DatabaseValue::from(true),
                    DatabaseValue::from(balance),
                ],
            )
            .await
            .expect("Insert failed");
        assert!(inserted.success());
        assert_eq!(inserted.generated_keys(), &[DatabaseValue::Long(1)]);

        let inserted = db
            .table("users")
            .unwrap()
            .insert_rows("name,active", vec![user("bob", false), user("carol", true)])
            .await
            .expect("Batch insert failed");
        assert_eq!(inserted.count(), 2);

        let rows = db
            .table("users")
            .unwrap()
            .where_eq("active", true)
            .order_asc("id")
            .get()
            .await
            .expect("Select failed");
        let names: Vec<String> = rows
            .iter()
            .filter_map(|r| r.get("name").map(|v| v.as_string()))
            .collect();
        assert_eq!(names, vec!["alice", "carol"]);

        let alice = rows.first().expect("No rows");
        assert_eq!(alice.get("active"), Some(&DatabaseValue::Bool(true)));
        assert_eq!(
            alice.get("balance").and_then(|v| v.as_decimal()),
            Some(balance)
        );
        assert_eq!(alice.get("created_at"), Some(&DatabaseValue::Null));

        let rows = db
            .table("users")
            .unwrap()
            .where_in("id", [2, 3])
            .get()
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_first_keeps_builder_state() {
        let db = open_database().await;
        create_users(&db).await;
        db.table("users")
            .unwrap()
            .insert_rows("name,active", vec![user("a", true), user("b", true), user("c", false)])
            .await
            .unwrap();

        let mut query = db.table("users").unwrap().order_desc("id").limit(2);
        let row = query.first().await.unwrap().expect("No row");
        assert_eq!(row.get("name").map(|v| v.as_string()), Some("c".to_string()));

        assert_eq!(query.get().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = open_database().await;
        create_users(&db).await;
        db.table("users")
            .unwrap()
            .insert_rows("name,active", vec![user("alice", true), user("bob", false)])
            .await
            .unwrap();

        let stamp = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let updated = db
            .table("users")
            .unwrap()
            .where_eq("name", "bob")
            .update("active,created_at", vec![DatabaseValue::from(true), stamp.into()])
            .await
            .unwrap();
        assert_eq!(updated.count(), 1);

        let bob = db
            .table("users")
            .unwrap()
            .where_eq("name", "bob")
            .get()
            .await
            .unwrap();
        assert_eq!(
            bob.first().and_then(|r| r.get("created_at")).cloned(),
            Some(DatabaseValue::DateTime(stamp))
        );

        let deleted = db
            .table("users")
            .unwrap()
            .where_eq("name", "alice")
            .delete()
            .await
            .unwrap();
        assert_eq!(deleted.count(), 1);

        let missing = db
            .table("users")
            .unwrap()
            .where_eq("name", "nobody")
            .delete()
            .await
            .unwrap();
        assert!(missing.fails());

        let rows = db
            .table("users")
            .unwrap()
            .select("COUNT(*) AS total")
            .get()
            .await
            .unwrap();
        assert_eq!(rows.first().and_then(|r| r.get("total")).and_then(|v| v.as_long()), Some(1));
    }

    #[tokio::test]
    async fn test_alter_and_drop() {
        let db = open_database().await;
        db.create("posts", |t| {
            t.integer("id");
            t.string("title", 200);
            t.primary("id");
        })
        .await
        .unwrap();

        db.alter("posts", |t| {
            t.text("body").nullable();
            t.index("title");
        })
        .await
        .expect("Failed to add column");
        db.insert("posts", "title,body", values(["hello", "world"]))
            .await
            .unwrap();

        db.alter("posts", |t| {
            t.drop_index("title_ix");
            t.drop_column("body");
        })
        .await
        .expect("Failed to drop column");

        let rows = db.table("posts").unwrap().get().await.unwrap();
        assert!(rows.first().is_some_and(|r| r.get("body").is_none()));

        db.drop("posts").await.unwrap();
        assert!(!db.exists("posts").await.unwrap());
    }

    #[tokio::test]
    async fn test_tables_sharing_unique_column() {
        let db = open_database().await;
        for table in ["users", "admins"] {
            db.create(table, |t| {
                t.string("email", 100);
                t.unique("email");
            })
            .await
            .expect("Failed to create table");
        }

        db.insert("users", "email", "a@example.com").await.unwrap();
        db.insert("admins", "email", "a@example.com").await.unwrap();
        let err = db.insert("admins", "email", "a@example.com").await.unwrap_err();
        assert!(matches!(err, DatabaseError::SqliteError(_)));

        db.alter("users", |t| t.drop_unique("email_uq"))
            .await
            .expect("Failed to drop unique index");
        db.insert("users", "email", "a@example.com").await.unwrap();
        assert!(db
            .insert("admins", "email", "a@example.com")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_concurrent_inserts() {
        let db = Arc::new(open_database().await);
        db.create("events", |t| {
            t.integer("id");
            t.integer("value");
            t.primary("id");
        })
        .await
        .unwrap();

        let mut handles = vec![];
        for i in 0..10 {
            let db_clone = Arc::clone(&db);
            let handle = tokio::spawn(async move { db_clone.insert("events", "value", i * 10).await });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.expect("Task panicked").expect("Insert failed");
        }

        let rows = db
            .table("events")
            .unwrap()
            .select("COUNT(*) AS count")
            .get()
            .await
            .expect("Query failed");
        assert_eq!(rows.first().and_then(|r| r.get("count")).and_then(|v| v.as_long()), Some(10));
    }

    #[tokio::test]
    async fn test_errors_before_execution() {
        let db = open_database().await;

        let err = db.table("missing").unwrap().offset(5).get().await.unwrap_err();
        assert!(err.is_compilation());
        assert_eq!(err.to_string(), "Compilation error: Can't create offset without limit");

        let err = db
            .table("missing")
            .unwrap()
            .insert_rows("a,b", vec![values([1, 2]), values([3])])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("row 2"));

        let err = db.table("missing").unwrap().get().await.unwrap_err();
        assert!(matches!(err, DatabaseError::SqliteError(_)));
    }

    struct CreateTable {
        id: &'static str,
        table: &'static str,
    }

    #[async_trait]
    impl Migration for CreateTable {
        fn id(&self) -> &str {
            self.id
        }

        async fn up(&self, db: &Database) -> Result<()> {
            db.create(self.table, |t| {
                t.integer("id");
                t.primary("id");
            })
            .await
        }

        async fn down(&self, db: &Database) -> Result<()> {
            db.drop(self.table).await
        }
    }

    #[tokio::test]
    async fn test_migrations_through_registry() {
        let configuration = Configuration::from_json(
            r#"{
                "databases": [ { "name": "main", "backend": "sqlite" } ],
                "migrations": ["app"]
            }"#,
        )
        .unwrap();
        let mut registry = Registry::from_configuration(configuration).unwrap();

        let mut migrator = Migrator::new();
        migrator
            .add(CreateTable { id: "create_users", table: "users" })
            .unwrap();
        migrator
            .add(CreateTable { id: "create_posts", table: "posts" })
            .unwrap();
        registry.register_migrator("app", migrator);
        registry.open_all().await.unwrap();

        assert_eq!(
            registry.migrate("main").await.unwrap(),
            vec!["create_users", "create_posts"]
        );
        assert!(registry.migrate("main").await.unwrap().is_empty());

        let db = registry.database("main").unwrap();
        let migrator = registry.migrator("app").unwrap();
        let records = db.table("migrations").unwrap().order_asc("number").get().await.unwrap();
        let numbers: Vec<i64> = records
            .iter()
            .filter_map(|r| r.get("number").and_then(|v| v.as_long()))
            .collect();
        assert_eq!(numbers, vec![1, 2]);

        assert_eq!(
            migrator.rollback(db).await.unwrap(),
            vec!["create_posts", "create_users"]
        );
        assert!(!db.exists("users").await.unwrap());
        assert_eq!(
            migrator.status(db).await.unwrap(),
            vec![
                ("create_users".to_string(), MigrationStatus::Pending),
                ("create_posts".to_string(), MigrationStatus::Pending),
            ]
        );

        registry.migrate("main").await.unwrap();
        assert_eq!(migrator.reset(db).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_closed_database() {
        let mut registry = Registry::new();
        registry
            .add_database(DatabaseConfig::new("main", DatabaseType::Sqlite))
            .unwrap();

        let db = registry.database("main").unwrap();
        assert!(matches!(db.table("users"), Err(DatabaseError::NotConnected(_))));
        assert!(matches!(
            registry.database("other"),
            Err(DatabaseError::DatabaseNotFound(_))
        ));
    }
}
