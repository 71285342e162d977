//! Basic database usage example
//!
//! This example demonstrates:
//! - Loading a registry from JSON configuration
//! - Creating tables with a blueprint
//! - Inserting, querying, updating and deleting through the query builder
//! - Running and rolling back migrations
//!
//! Run with: cargo run --example basic_usage

use async_trait::async_trait;
use rust_database_layer::prelude::*;

struct CreateAuditLog;

#[async_trait]
impl Migration for CreateAuditLog {
    fn id(&self) -> &str {
        "create_audit_log"
    }

    async fn up(&self, db: &Database) -> Result<()> {
        db.create("audit_log", |t| {
            t.integer("id");
            t.string("message", 255);
            t.date_time("logged_at").nullable();
            t.primary("id");
        })
        .await
    }

    async fn down(&self, db: &Database) -> Result<()> {
        db.drop("audit_log").await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Database Layer - Basic Usage Example ===\n");

    println!("1. Loading configuration...");
    let configuration = Configuration::from_json(
        r#"{
            "databases": [
                { "name": "main", "backend": "sqlite", "properties": { "database": ":memory:" } }
            ],
            "migrations": ["app"]
        }"#,
    )?;
    let mut registry = Registry::from_configuration(configuration)?;

    let mut migrator = Migrator::new();
    migrator.add(CreateAuditLog)?;
    registry.register_migrator("app", migrator);
    registry.open_all().await?;
    println!("   ✓ Opened {:?}\n", registry.database_names());

    let db = registry.database("main")?;

    println!("2. Creating table...");
    db.create("users", |t| {
        t.integer("id");
        t.string("username", 50);
        t.string("email", 100);
        t.integer("age").nullable();
        t.decimal("balance", 10, 2).default(0);
        t.boolean("is_active").default(true);
        t.primary("id");
        t.unique("email");
    })
    .await?;
    println!("   ✓ Table created\n");

    println!("3. Inserting data...");
    let users = vec![
        ("alice", "alice@example.com", 30),
        ("bob", "bob@example.com", 25),
        ("charlie", "charlie@example.com", 35),
        ("diana", "diana@example.com", 28),
    ];
    let rows: Vec<DatabaseValue> = users
        .into_iter()
        .map(|(username, email, age)| {
            values([
                DatabaseValue::from(username),
                DatabaseValue::from(email),
                DatabaseValue::from(age),
            ])
        })
        .collect();
    let affected = db
        .table("users")?
        .insert_rows("username,email,age", rows)
        .await?;
    println!("   ✓ Inserted {} row(s)\n", affected.count());

    println!("4. Querying users older than 26...");
    let results = db
        .table("users")?
        .select("id, username, age, is_active")
        .r#where("age", ">", 26)
        .order_asc("age")
        .get()
        .await?;
    for row in &results {
        println!(
            "   - #{} {} ({}), active: {}",
            row.get("id").map(|v| v.as_string()).unwrap_or_default(),
            row.get("username").map(|v| v.as_string()).unwrap_or_default(),
            row.get("age").map(|v| v.as_string()).unwrap_or_default(),
            row.get("is_active").and_then(|v| v.as_bool()).unwrap_or(false),
        );
    }
    println!();

    println!("5. Updating and deleting...");
    let updated = db
        .table("users")?
        .where_eq("username", "bob")
        .update("is_active", false)
        .await?;
    let deleted = db
        .table("users")?
        .where_eq("username", "diana")
        .delete()
        .await?;
    println!(
        "   ✓ Updated {} row(s), deleted {} row(s)\n",
        updated.count(),
        deleted.count()
    );

    println!("6. Running migrations...");
    let applied = registry.migrate("main").await?;
    println!("   ✓ Applied {:?}", applied);
    if let Some(migrator) = registry.migrator("app") {
        for (id, status) in migrator.status(db).await? {
            println!("   - {}: {:?}", id, status);
        }
        let reverted = migrator.rollback(db).await?;
        println!("   ✓ Rolled back {:?}\n", reverted);
    }

    registry.close_all().await?;
    println!("=== Example completed successfully ===");

    Ok(())
}
