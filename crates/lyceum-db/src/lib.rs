//! Lyceum Database — SurrealDB connection management, schema
//! migrations, the paginated query executor and repository
//! implementations for the `lyceum-core` traits.

mod connection;
mod error;
mod query;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
