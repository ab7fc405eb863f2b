//! # Taskdeck
//!
//! Task-management REST API built around a generic query/data-access core.
//!
//! ## Overview
//!
//! Users register, authenticate, manage tasks, assign them to other users,
//! and view a completion-rate leaderboard. The interesting machinery is the
//! shared query layer: relational filters, sorts, nested eager loads, and
//! pagination are expressed as plain key/value structures
//! (`first_name.not=Bill`, `due_date.gte=2025-01-01`), validated against
//! per-endpoint schemas, and translated into composed SQL.
//!
//! ## Module Organization
//!
//! - [`query`] - Filter/order grammar, schema-validated parsing, SQL
//!   composition
//! - [`dao`] - Generic data-access layer and per-entity accessors
//! - [`models`] - Persisted entities and their static relation registry
//! - [`web`] - Axum routes, guards, and response envelope
//! - [`config`] / [`logging`] / [`error`] / [`constants`] - process plumbing
//!
//! ## Design Notes
//!
//! Accessors are a generic type composed with per-entity extensions, not a
//! class hierarchy; the entity registry is static and assembled at startup.
//! Row absence is `None` everywhere below the HTTP layer, and engine
//! failures surface as one normalized data-access error kind.

pub mod config;
pub mod constants;
pub mod dao;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod web;

pub use config::AppConfig;
pub use constants::{TaskPriority, TaskStatus, TokenType};
pub use error::{Error, Result};
