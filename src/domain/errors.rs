//! Domain error types
//!
//! Every failure a domain operation can produce classifies into exactly one
//! of these kinds, so the calling layer can translate each into a
//! field-specific or user-facing message.

use std::fmt;

use sea_orm::{DbErr, SqlErr};

#[derive(Debug)]
pub enum DomainError {
    /// No row matches the given id
    NotFound,
    /// A unique or foreign-key constraint rejected the write
    Constraint(String),
    /// Transient lock contention; retried internally, surfaced only after
    /// the retry budget is exhausted
    Busy,
    /// Caller-supplied value fails a core-level invariant
    Invalid(String),
    /// Any other database/persistence failure
    Database(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NotFound => write!(f, "Resource not found"),
            DomainError::Constraint(msg) => write!(f, "Constraint violated: {}", msg),
            DomainError::Busy => write!(f, "Database busy"),
            DomainError::Invalid(msg) => write!(f, "Invalid operation: {}", msg),
            DomainError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<DbErr> for DomainError {
    fn from(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return DomainError::Constraint(msg);
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return DomainError::Constraint(msg);
            }
            _ => {}
        }

        let msg = e.to_string();
        let lower = msg.to_lowercase();
        // SQLITE_BUSY / SQLITE_LOCKED surface as plain messages through the
        // driver; both mean another writer holds the file.
        if lower.contains("database is locked") || lower.contains("busy") {
            DomainError::Busy
        } else {
            DomainError::Database(msg)
        }
    }
}
