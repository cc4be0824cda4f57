// SPDX-License-Identifier: MIT

//! Stable error codes and the HTTP error body.

use serde::{Deserialize, Serialize};

/// Stable string codes; clients and the CLI match on these, never on
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InvalidInput,
    InvalidState,
    InvalidAgent,
    SessionExists,
    NoSession,
    NoEvents,
    NoResumableSession,
    InternalError,
    Conflict,
}

impl ErrorCode {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::NotFound | ErrorCode::NoSession | ErrorCode::NoResumableSession => 404,
            ErrorCode::ValidationError
            | ErrorCode::InvalidInput
            | ErrorCode::InvalidState
            | ErrorCode::InvalidAgent
            | ErrorCode::NoEvents => 400,
            ErrorCode::SessionExists | ErrorCode::Conflict => 409,
            ErrorCode::InternalError => 500,
        }
    }

    /// Normative CLI exit codes.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::InvalidInput => 2,
            ErrorCode::ValidationError => 3,
            ErrorCode::NotFound | ErrorCode::NoSession | ErrorCode::NoResumableSession => 4,
            ErrorCode::Conflict
            | ErrorCode::SessionExists
            | ErrorCode::InvalidState
            | ErrorCode::InvalidAgent => 5,
            ErrorCode::NoEvents | ErrorCode::InternalError => 1,
        }
    }
}

/// `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { error: ErrorDetail { code, message: message.into() } }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
