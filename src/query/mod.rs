//! # Query System
//!
//! Declarative filter/order grammar, schema-validated request parsing, and
//! SQL composition shared by the data-access layer and the HTTP surface.
//!
//! ## Key Components
//!
//! - [`operators`] - Dotted-key operator grammar (`field.operator=value`)
//! - [`schema`] - Per-endpoint field rules and body validation
//! - [`parser`] - Schema-validated query parsing with all-errors-collected
//!   semantics
//! - [`filter`] - Ordered predicate sets and WHERE translation
//! - [`order`] - Ordered sort terms with deterministic term order
//! - [`include`] - Eager-load trees (relation, projection, nested includes)
//! - [`page`] - Pagination math and response metadata
//! - [`select`] - SELECT statement composition from the pieces above
//!
//! ## Flow
//!
//! Raw query parameters are validated by [`parser::parse`] against an
//! endpoint's [`schema::FieldSchema`]; the surviving values become a
//! [`filter::Filter`] / [`order::OrderSpec`] and flow into the data-access
//! layer, which composes one [`select::SelectStatement`] per fetch.

pub mod filter;
pub mod include;
pub mod operators;
pub mod order;
pub mod page;
pub mod parser;
pub mod schema;
pub mod select;

pub use filter::Filter;
pub use include::Include;
pub use operators::Operator;
pub use order::{Direction, OrderSpec};
pub use page::PageInfo;
pub use parser::{parse, Parsed};
pub use schema::{FieldRule, FieldSchema};
pub use select::SelectStatement;
