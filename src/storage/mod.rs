//! Local storage module for task persistence
//!
//! This module owns the SQLite connection (through SeaORM) and the schema for:
//! - Tasks
//! - Task lists and their members
//! - The calendar import mapping table
//!
//! Queries live in [`crate::repositories`].

pub mod db;

pub use db::{LocalStorage, DEFAULT_LIST_NAME};
