//! SQL processing module
//!
//! This module provides:
//! - `parser`: SQL lexer and parser
//! - `types`: values and data types
//! - `schema`: table and column definitions
//! - `catalog`: the read-only set of tables queries run against
//! - `plan`: execution plan generation
//! - `executor`: relational operators
//! - `engine`: the query façade

pub mod catalog;
pub mod engine;
pub mod executor;
pub mod parser;
pub mod plan;
pub mod schema;
pub mod types;
