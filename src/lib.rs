//! # Rust Database Layer
//!
//! A dialect-agnostic relational access layer: fluent statement builders
//! record clause components, a per-dialect grammar compiles them into SQL text
//! with positional placeholders, and a handler hands the text and its ordered
//! parameters to a backend link. A migration sequencer applies and reverts
//! named schema changes in batches.
//!
//! ## Features
//!
//! - **Statement builders**: [`Query`] for SELECT/INSERT/UPDATE/DELETE and
//!   [`Blueprint`] for CREATE/ALTER/DROP TABLE
//! - **Dialects**: generic, MySQL, H2 and SQLite grammars sharing one
//!   compilation algorithm
//! - **Pluggable backends**: a backend supplies a [`Linker`], two grammars
//!   and a [`Transform`] bundled as a [`Support`]
//! - **Migrations**: tracked in a `migrations` table, rolled back per batch
//! - **Async Support**: Async/await support with Tokio
//!
//! ## Supported Databases
//!
//! | Database | Grammar | Link |
//! |----------|---------|------|
//! | SQLite | ✅ | ✅ bundled (`sqlite` feature) |
//! | MySQL | ✅ | bring your own [`Linker`] |
//! | H2 | ✅ | bring your own [`Linker`] |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_database_layer::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut registry = Registry::from_configuration(Configuration::from_json(
//!         r#"{ "databases": [ { "name": "main", "backend": "sqlite" } ] }"#,
//!     )?)?;
//!     registry.open_all().await?;
//!     let db = registry.database("main")?;
//!
//!     db.create("users", |t| {
//!         t.integer("id");
//!         t.string("name", 100);
//!         t.primary("id");
//!     })
//!     .await?;
//!
//!     db.insert("users", "name", "Alice").await?;
//!
//!     let rows = db.table("users")?.where_eq("name", "Alice").get().await?;
//!     for row in &rows {
//!         if let Some(name) = row.get("name") {
//!             println!("User: {}", name.as_string());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Compiling without a connection
//!
//! ```rust
//! use rust_database_layer::core::Query;
//! use rust_database_layer::grammar::{GenericQueryGrammar, Grammar};
//!
//! let query = Query::new().table("t").r#where("a", "=", 1).r#where("b", "=", 2);
//! let sql = GenericQueryGrammar.compile(&query.to_select()).unwrap();
//!
//! assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND b = ?");
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! rust_database_layer/
//! ├── src/
//! │   ├── core/              # Builders, handler, links, registry, migrations
//! │   ├── grammar/           # Components, bindings and dialect compilers
//! │   ├── backends/          # SQLite implementation
//! │   └── lib.rs
//! ├── demos/                 # Example programs
//! ├── tests/                 # Integration and property tests
//! └── benches/               # Compilation benchmarks
//! ```

/// Core database layer types and traits
pub mod core;

/// Statement components and dialect grammars
pub mod grammar;

/// Database backend implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_database_layer::prelude::*;
///
/// let query = Query::new().table("users").where_eq("id", 1);
/// assert_eq!(query.bindings().all(), vec![DatabaseValue::Int(1)]);
/// ```
pub mod prelude {
    pub use crate::core::{
        values, Affecting, Blueprint, Configuration, Database, DatabaseConfig, DatabaseError,
        DatabaseType, DatabaseValue, Migration, MigrationStatus, Migrator, Query, Registry,
        Result, Row, RowList,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::sqlite_support;
}

// Re-export at root level for convenience
pub use core::{
    Affecting, Blueprint, Configuration, Database, DatabaseConfig, DatabaseError, DatabaseType,
    DatabaseValue, Handler, Link, Linker, Migration, Migrator, Query, Registry, Result, Row,
    RowList, Support, Transform,
};
