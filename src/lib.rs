//! tasksync - offline-first task synchronization
//!
//! This library keeps a local SQLite task store in sync with a remote task
//! store, and imports and exports tasks to and from a calendar. Local edits
//! are tracked per task as SYNCED, DIRTY or DELETED; a sync pushes pending
//! local changes and then pulls remote ones without overwriting anything that
//! has not been pushed yet.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`storage`] - Local database and schema setup
//! * [`repositories`] - Database queries over the entities
//! * [`backend`] - Remote task stores
//! * [`sync`] - Push/pull synchronization and local task operations
//! * [`calendar`] - Calendar sources and the import/export engine
//! * [`sync_coordinator`] - One-operation-at-a-time front door
//! * [`app`] - Composition of all of the above from a [`config::Config`]

/// Composition root
pub mod app;

/// Remote task store abstraction and implementations
pub mod backend;

/// Calendar sources and the calendar import/export engine
pub mod calendar;

/// Configuration module for managing application settings
pub mod config;

/// SeaORM entity models for database tables
pub mod entities;

/// Error types and failure classification
pub mod error;

/// Logging setup
pub mod logger;

/// Repository layer for database operations
pub mod repositories;

/// Local storage layer
pub mod storage;

/// Synchronization engine for keeping local and remote data in sync
pub mod sync;

/// Serialization of sync and calendar operations
pub mod sync_coordinator;

/// Utility functions for date/time handling
pub mod utils;

// Re-export entity models for convenient access
pub use entities::{calendar_import_map, list_member, task, task_list};
