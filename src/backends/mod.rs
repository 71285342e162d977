//! Database backend implementations
//!
//! Each backend provides a [`Support`](crate::core::Support) bundle: its
//! dialect grammars, a linker and a value transform.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{
    sqlite_support, SqliteLink, SqliteLinker, SqliteQueryGrammar, SqliteSchemaGrammar,
    SqliteTransform,
};
