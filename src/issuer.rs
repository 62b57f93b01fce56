//! Issuer/Refresher: the only writer of the session store.
//!
//! Every operation takes the request's [`SessionJar`] and leaves it in one of
//! three states: untouched, fully rewritten with a new pair, or fully cleared.
//! Secrets are never part of a return value.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::AuthError,
    principal::Principal,
    session::{CredentialPair, SessionJar},
    singleflight::SingleFlight,
    validator::{CredentialValidator, ValidatorError},
};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

type RenewalOutcome = Result<CredentialPair, ValidatorError>;

pub struct Issuer {
    validator: Arc<dyn CredentialValidator>,
    renewals: SingleFlight<[u8; 32], RenewalOutcome>,
}

impl Issuer {
    #[must_use]
    pub fn new(validator: Arc<dyn CredentialValidator>) -> Self {
        Self {
            validator,
            renewals: SingleFlight::new(),
        }
    }

    /// Exchange a username/password for a principal, writing the pair into `jar`.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` on bad input or any validator failure. The
    /// jar is not written in that case.
    #[instrument(skip(self, jar, password))]
    pub async fn login(
        &self,
        jar: &mut SessionJar,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, AuthError> {
        validate_login_input(username, password)?;

        let issued = self.validator.login(username, password).await.map_err(|e| {
            warn!("login rejected: {e}");
            AuthError::InvalidCredentials("Invalid credentials".to_string())
        })?;

        jar.store(issued.credentials);

        info!("login succeeded for principal {}", issued.principal.id);

        Ok(issued.principal)
    }

    /// Rotate the pair held in `jar`.
    ///
    /// Concurrent renewals of the same renewal secret share one validator
    /// call, since the validator invalidates a renewal secret once it rotates.
    ///
    /// # Errors
    /// `NoSession` if the jar holds no renewal secret, `RenewalFailed` if the
    /// validator refuses. Both leave the jar cleared.
    #[instrument(skip_all)]
    pub async fn renew(&self, jar: &mut SessionJar) -> Result<(), AuthError> {
        let Some(renewal) = jar.renewal().cloned() else {
            debug!("renew without a renewal secret");
            jar.clear();
            return Err(AuthError::NoSession);
        };

        let key = fingerprint(&renewal);
        let validator = Arc::clone(&self.validator);
        let outcome = self
            .renewals
            .run(key, async move { validator.renew(&renewal).await })
            .await;

        match outcome {
            Ok(pair) => {
                jar.store(pair);
                debug!("session renewed");
                Ok(())
            }
            Err(e) => {
                warn!("renewal failed, clearing session: {e}");
                jar.clear();
                Err(AuthError::RenewalFailed)
            }
        }
    }

    /// Delete the session. Never fails.
    pub fn logout(&self, jar: &mut SessionJar) {
        jar.clear();
        debug!("session cleared");
    }

    /// Resolve the access secret in `jar` to a principal.
    ///
    /// # Errors
    /// `Unauthorized` if there is no access secret or the validator refuses it,
    /// `Transient` if the validator cannot be reached.
    #[instrument(skip_all)]
    pub async fn current_principal(&self, jar: &SessionJar) -> Result<Principal, AuthError> {
        let access = jar.access().ok_or(AuthError::Unauthorized)?;

        self.validator.identify(access).await.map_err(|e| {
            if e.is_transient() {
                warn!("identify unavailable: {e}");
                AuthError::Transient(e.to_string())
            } else {
                debug!("identify failed: {e}");
                AuthError::Unauthorized
            }
        })
    }
}

/// Reject obviously bad login input before any network call.
///
/// # Errors
/// Returns `InvalidCredentials` naming the first failing field.
pub fn validate_login_input(username: &str, password: &SecretString) -> Result<(), AuthError> {
    let username = username.trim();
    let password = password.expose_secret();

    if username.is_empty() {
        return Err(AuthError::InvalidCredentials(
            "Username is required".to_string(),
        ));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::InvalidCredentials(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidCredentials(
            "Password is required".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidCredentials(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    Ok(())
}

fn fingerprint(secret: &SecretString) -> [u8; 32] {
    Sha256::digest(secret.expose_secret().as_bytes()).into()
}
