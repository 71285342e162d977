//! Database migration system
//!
//! A [`Migrator`] applies registered [`Migration`]s in registration order and
//! records each one in a `migrations` tracking table. Every record written by
//! one [`Migrator::migrate`] call shares a timestamp, so the migrations of a
//! batch are rolled back together.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use rust_database_layer::core::{Database, Migration, Migrator, Result};
//!
//! struct CreateUsers;
//!
//! #[async_trait]
//! impl Migration for CreateUsers {
//!     fn id(&self) -> &str {
//!         "create_users"
//!     }
//!
//!     async fn up(&self, db: &Database) -> Result<()> {
//!         db.create("users", |t| {
//!             t.integer("id").incremented();
//!             t.string("name", 100);
//!             t.primary("id");
//!         })
//!         .await
//!     }
//!
//!     async fn down(&self, db: &Database) -> Result<()> {
//!         db.drop("users").await
//!     }
//! }
//!
//! let mut migrator = Migrator::new();
//! migrator.add(CreateUsers).unwrap();
//! assert_eq!(migrator.ids(), vec!["create_users"]);
//! ```

use super::database::Database;
use super::error::{DatabaseError, Result};
use super::value::{DatabaseValue, Row};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use std::collections::HashSet;
use tracing::info;

/// Name of the tracking table
pub const MIGRATIONS_TABLE: &str = "migrations";

/// One reversible schema change
#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique id recorded in the tracking table
    fn id(&self) -> &str;

    /// Apply the change
    async fn up(&self, db: &Database) -> Result<()>;

    /// Revert the change
    async fn down(&self, db: &Database) -> Result<()>;
}

/// Migration status for a registered migration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Migration has been applied
    Applied,
    /// Migration is pending
    Pending,
}

/// A row of the tracking table
#[derive(Debug, Clone, PartialEq)]
struct MigrationRecord {
    migration: String,
    created_at: NaiveDateTime,
    number: i64,
}

impl MigrationRecord {
    fn from_row(row: &Row) -> Result<Self> {
        let migration = row
            .get("migration")
            .and_then(DatabaseValue::as_str)
            .ok_or_else(|| DatabaseError::migration("Migration record without id"))?
            .to_string();
        let created_at = row
            .get("created_at")
            .and_then(DatabaseValue::as_date_time)
            .ok_or_else(|| {
                DatabaseError::migration(format!("Migration record {} without timestamp", migration))
            })?;
        let number = row
            .get("number")
            .and_then(DatabaseValue::as_long)
            .ok_or_else(|| {
                DatabaseError::migration(format!("Migration record {} without number", migration))
            })?;

        Ok(Self {
            migration,
            created_at,
            number,
        })
    }
}

/// Ordered set of migrations
#[derive(Default)]
pub struct Migrator {
    migrations: Vec<Box<dyn Migration>>,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator").field("ids", &self.ids()).finish()
    }
}

impl Migrator {
    /// Create an empty migrator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration; ids must be unique
    pub fn add<M: Migration + 'static>(&mut self, migration: M) -> Result<()> {
        if self.find(migration.id()).is_some() {
            return Err(DatabaseError::migration(format!(
                "Duplicate migration {}",
                migration.id()
            )));
        }
        self.migrations.push(Box::new(migration));
        Ok(())
    }

    /// Registered ids in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.migrations.iter().map(|m| m.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    fn find(&self, id: &str) -> Option<&dyn Migration> {
        self.migrations
            .iter()
            .find(|m| m.id() == id)
            .map(|m| m.as_ref())
    }

    fn registered(&self, id: &str) -> Result<&dyn Migration> {
        self.find(id)
            .ok_or_else(|| DatabaseError::migration(format!("Migration {} not found", id)))
    }

    async fn ensure_table(&self, db: &Database) -> Result<()> {
        if db.exists(MIGRATIONS_TABLE).await? {
            return Ok(());
        }

        db.create(MIGRATIONS_TABLE, |t| {
            t.string("migration", 255);
            t.date_time("created_at");
            t.integer("number");
        })
        .await
    }

    async fn records(&self, db: &Database) -> Result<Vec<MigrationRecord>> {
        if !db.exists(MIGRATIONS_TABLE).await? {
            return Ok(Vec::new());
        }

        let rows = db.table(MIGRATIONS_TABLE)?.get().await?;
        rows.iter().map(MigrationRecord::from_row).collect()
    }

    /// Apply every migration without a record
    ///
    /// Returns the applied ids in the order they ran.
    pub async fn migrate(&self, db: &Database) -> Result<Vec<String>> {
        self.ensure_table(db).await?;
        let records = self.records(db).await?;

        let applied: HashSet<&str> = records.iter().map(|r| r.migration.as_str()).collect();
        let mut number = records.iter().map(|r| r.number).max().unwrap_or(0);

        // batches must stay ordered even when the clock does not advance
        let mut batch = Utc::now().naive_utc();
        if let Some(latest) = records.iter().map(|r| r.created_at).max() {
            if batch <= latest {
                batch = latest + Duration::microseconds(1);
            }
        }

        let mut migrated = Vec::new();
        for migration in &self.migrations {
            if applied.contains(migration.id()) {
                continue;
            }

            migration.up(db).await?;
            number += 1;

            let record: Vec<DatabaseValue> = vec![
                migration.id().into(),
                batch.into(),
                number.into(),
            ];
            db.insert(MIGRATIONS_TABLE, "migration,created_at,number", record)
                .await?;

            info!(migration = migration.id(), number, "applied migration");
            migrated.push(migration.id().to_string());
        }

        Ok(migrated)
    }

    /// Revert the most recent batch
    ///
    /// Returns the reverted ids, latest first.
    pub async fn rollback(&self, db: &Database) -> Result<Vec<String>> {
        let records = self.records(db).await?;
        let Some(latest) = records.iter().map(|r| r.created_at).max() else {
            return Ok(Vec::new());
        };

        let batch = records.into_iter().filter(|r| r.created_at == latest).collect();
        self.revert(db, batch).await
    }

    /// Revert every applied migration
    pub async fn reset(&self, db: &Database) -> Result<Vec<String>> {
        let records = self.records(db).await?;
        self.revert(db, records).await
    }

    async fn revert(&self, db: &Database, mut records: Vec<MigrationRecord>) -> Result<Vec<String>> {
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.number.cmp(&a.number))
        });

        let mut reverted = Vec::new();
        for record in records {
            let migration = self.registered(&record.migration)?;
            migration.down(db).await?;

            db.table(MIGRATIONS_TABLE)?
                .where_eq("migration", record.migration.as_str())
                .delete()
                .await?;

            info!(migration = %record.migration, number = record.number, "reverted migration");
            reverted.push(record.migration);
        }

        Ok(reverted)
    }

    /// Status of every registered migration, in registration order
    pub async fn status(&self, db: &Database) -> Result<Vec<(String, MigrationStatus)>> {
        let records = self.records(db).await?;
        let applied: HashSet<&str> = records.iter().map(|r| r.migration.as_str()).collect();

        Ok(self
            .migrations
            .iter()
            .map(|m| {
                let status = if applied.contains(m.id()) {
                    MigrationStatus::Applied
                } else {
                    MigrationStatus::Pending
                };
                (m.id().to_string(), status)
            })
            .collect())
    }
}
