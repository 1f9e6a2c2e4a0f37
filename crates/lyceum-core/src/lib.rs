//! Lyceum Core — domain models, error taxonomy, repository traits and
//! the pure query/authorization primitives shared across all crates.

pub mod error;
pub mod external;
pub mod models;
pub mod query;
pub mod repository;
pub mod scope;
pub mod validate;
