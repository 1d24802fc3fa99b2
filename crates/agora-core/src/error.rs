use std::collections::BTreeMap;
use std::fmt;

use agora_db::DbError;
use serde::Serialize;

/// Coarse outcome class handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` if nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> Result<(), ForumError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ForumError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid target type: {0}")]
    InvalidTargetKind(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid target id: {0}")]
    InvalidTargetId(String),

    #[error("Query failed: {0}")]
    QueryFailed(DbError),

    #[error("Transaction failed: {0}")]
    TransactionFailed(DbError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl ForumError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            ForumError::Validation(_)
            | ForumError::InvalidTargetKind(_)
            | ForumError::InvalidAction(_)
            | ForumError::InvalidTargetId(_) => StatusClass::BadRequest,
            ForumError::InvalidCredentials | ForumError::Unauthenticated => StatusClass::Unauthorized,
            ForumError::NotFound(_) => StatusClass::NotFound,
            ForumError::Conflict(_) => StatusClass::Conflict,
            ForumError::QueryFailed(_) | ForumError::TransactionFailed(_) | ForumError::Hashing(_) => {
                StatusClass::Internal
            }
        }
    }

    /// Caller-facing message. Internal faults are not described beyond their class.
    pub fn message(&self) -> String {
        match self.status_class() {
            StatusClass::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Map a storage error raised inside a transaction.
    pub fn transaction(err: DbError) -> Self {
        match err {
            DbError::Conflict(detail) => ForumError::Conflict(detail),
            other => ForumError::TransactionFailed(other),
        }
    }
}

impl From<DbError> for ForumError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(detail) => ForumError::Conflict(detail),
            other => ForumError::QueryFailed(other),
        }
    }
}
