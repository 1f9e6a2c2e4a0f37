//! Domain models for Lyceum.
//!
//! These are the core types shared across all crates.

pub mod address;
pub mod document;
pub mod employee;
pub mod institute;
pub mod student;
pub mod user;
