//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// A single failed field-level check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Validation failed on: {}", fields(.0))]
    Validation(Vec<FieldViolation>),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("ID number already registered")]
    DuplicateIdNumber,

    #[error("Phone number already registered")]
    DuplicatePhoneNumber,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Server errors (5xx)
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Transaction failed: {0}")]
    TransactionFailed(StoreError),

    #[error("No free account number after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },
}

fn fields(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AppError {
    /// Validation failure on a single field
    pub fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldViolation {
            field: field.to_string(),
            code: code.to_string(),
            message: Some(message.into()),
        }])
    }

    /// Field names reported by a validation failure
    pub fn invalid_fields(&self) -> Vec<&str> {
        match self {
            AppError::Validation(violations) => violations.iter().map(|v| v.field.as_str()).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldViolation {
                    field: field.to_string(),
                    code: e.code.to_string(),
                    message: e.message.as_ref().map(|m| m.to_string()),
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(violations)
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut errors = Vec::new();
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::Validation(violations) => {
                errors = violations.clone();
                (StatusCode::BAD_REQUEST, "validation_error", None)
            }
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::AccountNotFound(number) => {
                (StatusCode::NOT_FOUND, "account_not_found", Some(number.clone()))
            }

            // 409 Conflict
            AppError::DuplicateIdNumber => {
                (StatusCode::CONFLICT, "duplicate_id_number", None)
            }
            AppError::DuplicatePhoneNumber => {
                (StatusCode::CONFLICT, "duplicate_phone_number", None)
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(ref domain_err) => {
                use crate::domain::DomainError;
                match domain_err {
                    DomainError::InsufficientBalance { .. } => {
                        (StatusCode::BAD_REQUEST, "insufficient_balance", Some(domain_err.to_string()))
                    }
                    DomainError::BalanceOverflow { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "balance_overflow", Some(domain_err.to_string()))
                    }
                    DomainError::CorruptBalance { .. } | DomainError::BrokenChain { .. } => {
                        tracing::error!("Ledger invariant violated: {}", domain_err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "ledger_error", None)
                    }
                }
            }

            // 500 Internal Server Error
            AppError::Persistence(e) => {
                tracing::error!("Persistence error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "transaction_failed", None)
            }
            AppError::GenerationExhausted { attempts } => {
                tracing::error!("Account number generation exhausted after {} attempts", attempts);
                (StatusCode::INTERNAL_SERVER_ERROR, "account_number_exhausted", None)
            }
        };

        // Infrastructure failures are logged above, not echoed to the client
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
            errors,
        };

        (status, Json(body)).into_response()
    }
}
