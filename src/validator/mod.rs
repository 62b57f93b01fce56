//! Remote credential validator.
//!
//! The validator checks username/password pairs, rotates renewal secrets and
//! resolves an access secret to a principal. It is the only component that
//! knows whether a secret is still good.

mod http;

pub use http::HttpValidator;

use futures::future::BoxFuture;
use secrecy::SecretString;
use std::fmt;
use thiserror::Error;

use crate::{principal::Principal, session::CredentialPair};

/// Remote operation names, used in errors and spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Renew,
    Identify,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::Renew => f.write_str("renew"),
            Self::Identify => f.write_str("identify"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    #[error("validator rejected {operation} with status {status}: {detail}")]
    Rejected {
        operation: Operation,
        status: u16,
        detail: String,
    },
    #[error("validator transport error: {0}")]
    Transport(String),
    #[error("validator timed out")]
    Timeout,
    #[error("malformed validator response: {0}")]
    Malformed(String),
}

impl ValidatorError {
    /// The validator could not be reached in time; says nothing about the secret.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

/// Result of a successful login: the profile plus a fresh pair.
#[derive(Debug, Clone)]
pub struct Issued {
    pub principal: Principal,
    pub credentials: CredentialPair,
}

/// Boxed-future trait so it can be shared as `Arc<dyn CredentialValidator>`.
pub trait CredentialValidator: Send + Sync {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<Issued, ValidatorError>>;

    /// Exchange a renewal secret for a new pair. The old renewal secret is
    /// single-use once this succeeds.
    fn renew<'a>(
        &'a self,
        renewal: &'a SecretString,
    ) -> BoxFuture<'a, Result<CredentialPair, ValidatorError>>;

    fn identify<'a>(
        &'a self,
        access: &'a SecretString,
    ) -> BoxFuture<'a, Result<Principal, ValidatorError>>;
}
