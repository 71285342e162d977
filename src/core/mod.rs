//! Core database layer types and traits
//!
//! This module provides the statement builders, the handler that hands
//! compiled statements to a backend link, value types, configuration and the
//! migration sequencer.

pub mod blueprint;
pub mod config;
pub mod database;
pub mod database_types;
pub mod error;
pub mod handler;
pub mod link;
pub mod migration;
pub mod query_builder;
pub mod registry;
pub mod transform;
pub mod value;

// Re-export commonly used types
pub use blueprint::{Blueprint, ColumnBuilder};
pub use config::{Configuration, DatabaseConfig};
pub use database::{Database, Support, SupportFactory};
pub use database_types::DatabaseType;
pub use error::{DatabaseError, Result};
pub use handler::Handler;
pub use link::{Link, Linker};
pub use migration::{Migration, MigrationStatus, Migrator, MIGRATIONS_TABLE};
pub use query_builder::Query;
pub use registry::Registry;
pub use transform::{DefaultTransform, Transform};
pub use value::{values, Affecting, DatabaseValue, Row, RowList};
