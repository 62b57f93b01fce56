//! Auth failure taxonomy and the recovery decision table.
//!
//! Every failure path in the issuer, the gate and the client resolves to one
//! [`AuthError`] kind. What happens next is read from [`AuthError::recovery`]
//! rather than from ad-hoc retry logic at call sites.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Bad username/password or a login payload that fails validation.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    /// No renewal secret is held in the session store.
    #[error("no active session")]
    NoSession,
    /// The validator rejected the renewal; the session has been destroyed.
    #[error("session renewal failed")]
    RenewalFailed,
    /// A guarded query was made without a usable access secret.
    #[error("unauthorized")]
    Unauthorized,
    /// Network failure or timeout.
    #[error("transient failure: {0}")]
    Transient(String),
}

/// What a caller should do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Render the message next to the login form.
    ShowInline,
    /// Silently route to the login screen.
    RouteToLogin,
    /// Drop local session state, then route to the login screen.
    ClearAndRouteToLogin,
    /// Reconcile the client cache as logged out; no renewal attempt.
    ReconcileLoggedOut,
    /// Retry once, then surface the error.
    RetryOnce,
}

impl AuthError {
    pub const CODE_INVALID_CREDENTIALS: &'static str = "invalid_credentials";
    pub const CODE_NO_SESSION: &'static str = "no_session";
    pub const CODE_RENEWAL_FAILED: &'static str = "renewal_failed";
    pub const CODE_UNAUTHORIZED: &'static str = "unauthorized";
    pub const CODE_TRANSIENT: &'static str = "transient";

    #[must_use]
    pub const fn recovery(&self) -> Recovery {
        match self {
            Self::InvalidCredentials(_) => Recovery::ShowInline,
            Self::NoSession => Recovery::RouteToLogin,
            Self::RenewalFailed => Recovery::ClearAndRouteToLogin,
            Self::Unauthorized => Recovery::ReconcileLoggedOut,
            Self::Transient(_) => Recovery::RetryOnce,
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.recovery(), Recovery::RetryOnce)
    }

    /// Stable code carried in JSON error bodies.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials(_) => Self::CODE_INVALID_CREDENTIALS,
            Self::NoSession => Self::CODE_NO_SESSION,
            Self::RenewalFailed => Self::CODE_RENEWAL_FAILED,
            Self::Unauthorized => Self::CODE_UNAUTHORIZED,
            Self::Transient(_) => Self::CODE_TRANSIENT,
        }
    }

    /// Rebuild an error from a wire code. Unknown codes read as `Unauthorized`.
    #[must_use]
    pub fn from_code(code: &str, message: &str) -> Self {
        match code {
            Self::CODE_INVALID_CREDENTIALS => Self::InvalidCredentials(message.to_string()),
            Self::CODE_NO_SESSION => Self::NoSession,
            Self::CODE_RENEWAL_FAILED => Self::RenewalFailed,
            Self::CODE_TRANSIENT => Self::Transient(message.to_string()),
            _ => Self::Unauthorized,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to show to the user. Only credential errors carry detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidCredentials(reason) => reason.clone(),
            Self::NoSession => "Not authenticated".to_string(),
            Self::RenewalFailed => "Failed to refresh session".to_string(),
            Self::Unauthorized => "Not authenticated".to_string(),
            Self::Transient(_) => "Service temporarily unavailable".to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
}

impl From<&AuthError> for ErrorBody {
    fn from(err: &AuthError) -> Self {
        Self {
            message: err.public_message(),
            code: err.code().to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}
