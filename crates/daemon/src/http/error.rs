// SPDX-License-Identifier: MIT

//! Typed-error to HTTP mapping.

use crate::session::SessionError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use el_engine::{ElementError, WorktreeError};
use el_wire::{ErrorBody, ErrorCode};

/// One error type for every handler; carries the stable code.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.code == ErrorCode::InternalError {
            tracing::error!(message = %self.message, "internal error surfaced to client");
        }
        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::Json(ErrorBody::new(self.code, self.message));
        (status, body).into_response()
    }
}

impl From<ElementError> for ApiError {
    fn from(e: ElementError) -> Self {
        let code = match &e {
            ElementError::NotFound(_) => ErrorCode::NotFound,
            ElementError::Validation(_) | ElementError::CycleDetected(_) => {
                ErrorCode::ValidationError
            }
            ElementError::ConcurrentModification { .. } | ElementError::DuplicateDependency(_) => {
                ErrorCode::Conflict
            }
            ElementError::InvalidState(_) => ErrorCode::InvalidState,
            ElementError::Store(_) | ElementError::Internal(_) => ErrorCode::InternalError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<WorktreeError> for ApiError {
    fn from(e: WorktreeError) -> Self {
        let code = match &e {
            WorktreeError::NoRepository(_) | WorktreeError::UnknownWorktree(_) => {
                ErrorCode::NotFound
            }
            WorktreeError::PathInUse(_) => ErrorCode::Conflict,
            WorktreeError::MainWorktree | WorktreeError::BadTransition(_) => {
                ErrorCode::InvalidState
            }
            WorktreeError::Git { .. } | WorktreeError::Io(_) | WorktreeError::Store(_) => {
                ErrorCode::InternalError
            }
        };
        Self::new(code, e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        if let SessionError::Engine(inner) = e {
            return ApiError::from(inner);
        }
        let code = match &e {
            SessionError::SessionExists(_) => ErrorCode::SessionExists,
            SessionError::NoSession(_) => ErrorCode::NoSession,
            SessionError::NoResumableSession(_) => ErrorCode::NoResumableSession,
            SessionError::InvalidAgent(_) => ErrorCode::InvalidAgent,
            _ => ErrorCode::InternalError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(ErrorCode::InvalidInput, rejection.body_text())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
