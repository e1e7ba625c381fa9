//! Database error types.
//!
//! This module provides abstracted error types for store and repository
//! operations. It uses miette for fancy diagnostic output and thiserror for
//! derive macros. The error types are storage-backend agnostic.

use std::fmt;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Joins field errors for display in a single line.
fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Entity not found: {entity_type} with id '{id}'")]
    #[diagnostic(code(homeboard::db::not_found))]
    NotFound { entity_type: String, id: String },

    #[error("Entity already exists: {entity_type} with {field} '{value}'")]
    #[diagnostic(
        code(homeboard::db::unique_violation),
        help("Values of this field must be unique across the collection.")
    )]
    UniqueViolation {
        entity_type: String,
        field: String,
        value: String,
    },

    #[error("Invalid data: {message} (hint: {help})")]
    #[diagnostic(code(homeboard::db::invalid_data))]
    InvalidData { message: String, help: String },

    #[error("Validation error: {}", join_field_errors(.errors))]
    #[diagnostic(code(homeboard::db::validation_error))]
    Validation { errors: Vec<FieldError> },

    #[error("Database error: {message}")]
    #[diagnostic(code(homeboard::db::database_error))]
    Database { message: String },

    #[error("Migration {version} ({name}) failed: {message}")]
    #[diagnostic(
        code(homeboard::db::migration_error),
        help("Earlier migrations stay applied. Fix the script and run `hb migrate` again.")
    )]
    Migration {
        version: i64,
        name: String,
        message: String,
    },

    #[error("Storage unavailable: {message}")]
    #[diagnostic(code(homeboard::db::storage_unavailable))]
    StorageUnavailable { message: String },

    #[error("Constraint violation: {message}")]
    #[diagnostic(code(homeboard::db::constraint))]
    Constraint { message: String },
}

impl DbError {
    pub(crate) fn not_found(entity_type: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn database(message: impl ToString) -> Self {
        DbError::Database {
            message: message.to_string(),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
