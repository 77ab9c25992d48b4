use std::fmt::Display;

use thiserror::Error;

/// Custom Result type for sandql operations
pub type Result<T> = std::result::Result<T, Error>;

/// Clause of a SELECT statement, used to locate parse failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Select,
    From,
    Join,
    Where,
    GroupBy,
    OrderBy,
    Limit,
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Clause::Select => "SELECT",
            Clause::From => "FROM",
            Clause::Join => "JOIN",
            Clause::Where => "WHERE",
            Clause::GroupBy => "GROUP BY",
            Clause::OrderBy => "ORDER BY",
            Clause::Limit => "LIMIT",
        })
    }
}

/// Error types for sandql
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Statement starts with a mutating or DDL keyword
    #[error("permission denied: {0} statements are not allowed, only SELECT is supported")]
    PermissionDenied(String),
    /// Input is not a recognizable SELECT
    #[error("unsupported syntax: {0}")]
    UnsupportedSyntax(String),
    #[error("table {0} does not exist")]
    UnknownTable(String),
    #[error("column {0} does not exist")]
    UnknownColumn(String),
    /// Bare column name matches columns of more than one joined table
    #[error("column {0} is ambiguous, qualify it with a table alias")]
    AmbiguousColumn(String),
    #[error("join key {0} not found")]
    JoinKeyNotFound(String),
    /// Clause is present but could not be parsed
    #[error("malformed {clause} clause: {message}")]
    MalformedClause { clause: Clause, message: String },
    /// Unexpected failure while evaluating a query
    #[error("internal evaluation error: {0}")]
    Internal(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Discriminant of an [`Error`], handed to callers next to the diagnostic text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    UnsupportedSyntax,
    UnknownTable,
    UnknownColumn,
    AmbiguousColumn,
    JoinKeyNotFound,
    MalformedClause,
    InternalEvaluationError,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Error::UnsupportedSyntax(_) => ErrorKind::UnsupportedSyntax,
            Error::UnknownTable(_) => ErrorKind::UnknownTable,
            Error::UnknownColumn(_) => ErrorKind::UnknownColumn,
            Error::AmbiguousColumn(_) => ErrorKind::AmbiguousColumn,
            Error::JoinKeyNotFound(_) => ErrorKind::JoinKeyNotFound,
            Error::MalformedClause { .. } => ErrorKind::MalformedClause,
            Error::Internal(_) => ErrorKind::InternalEvaluationError,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub fn malformed(clause: Clause, message: impl Into<String>) -> Self {
        Error::MalformedClause {
            clause,
            message: message.into(),
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl From<bincode::Error> for Error {
    fn from(value: bincode::Error) -> Self {
        Error::Internal(value.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::Config(value.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(value: toml::ser::Error) -> Self {
        Error::Config(value.to_string())
    }
}
