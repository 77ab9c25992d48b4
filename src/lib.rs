//! sandql - a sandboxed, read-only SQL engine over in-memory tables
//!
//! This crate provides:
//! - SQL parsing of a constrained SELECT dialect (lexer, parser, AST)
//! - Query planning and execution over an immutable catalog
//! - A query façade that turns every failure into a typed diagnostic
//! - A demo payment-reconciliation catalog

pub mod config;
pub mod demo;
pub mod error;
pub mod sql;

pub use config::EngineConfig;
pub use error::{Error, ErrorKind, Result};
pub use sql::catalog::{Catalog, TableProvider};
pub use sql::engine::{
    QueryEngine, QueryOutcome, QueryResult, ResultTable, Session, install_panic_hook,
};
