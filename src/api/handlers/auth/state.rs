//! Shared state for the auth endpoints.

use axum::{
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::{
    config::AuthConfig,
    issuer::Issuer,
    session::{CookiePolicy, SessionJar},
    validator::CredentialValidator,
};

pub struct AuthState {
    config: AuthConfig,
    policy: CookiePolicy,
    issuer: Issuer,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, validator: Arc<dyn CredentialValidator>) -> Self {
        Self {
            policy: CookiePolicy::from_config(&config),
            issuer: Issuer::new(validator),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// Load the session jar for an incoming request.
    #[must_use]
    pub fn jar(&self, headers: &HeaderMap) -> SessionJar {
        SessionJar::from_headers(headers, self.policy)
    }
}

/// Attach the jar's pending `Set-Cookie` headers to a response.
pub(crate) fn with_session(jar: &SessionJar, response: impl IntoResponse) -> Response {
    let cookies = match jar.set_cookie_headers() {
        Ok(cookies) => cookies,
        Err(err) => {
            error!("Failed to encode session cookie: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = response.into_response();
    for cookie in cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
