//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an item does not exist **or** the caller is
//!   not allowed to see it. The two cases are deliberately the same error.
//! - [`Validation`] thrown when user input fails field validation.
//! - [`InvalidCredentials`] thrown by login on a bad username/password pair.
//! - [`Unauthenticated`] thrown when a token is unknown.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidCredentials`]: EngineError::InvalidCredentials
//!  [`Unauthenticated`]: EngineError::Unauthenticated
use sea_orm::DbErr;
use thiserror::Error;

use crate::FieldErrors;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials,
    #[error("Invalid token.")]
    Unauthenticated,
    #[error("Password hashing failed: {0}")]
    Password(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl From<FieldErrors> for EngineError {
    fn from(value: FieldErrors) -> Self {
        Self::Validation(value)
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidCredentials, Self::InvalidCredentials) => true,
            (Self::Unauthenticated, Self::Unauthenticated) => true,
            (Self::Password(a), Self::Password(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
