//! SQL utilities for specifications
//!
//! Provides condition rendering, statement generation and identifier sanitization.

pub mod condition;
pub mod sanitize;
pub mod select;

pub use condition::{build_condition_clause, build_order_by_clause};
pub use sanitize::{POSTGRES_RESERVED_WORDS, quote_identifier, validate_identifier};
pub use select::{SqlQuery, build_count, build_exists, build_select};
