//! HTTP client for the auth query surface.
//!
//! Requests carry the session through a private cookie store, the way a
//! browser forwards `HttpOnly` cookies; the secrets are never readable here.

use futures::{FutureExt, future::BoxFuture};
use reqwest::{Client, Response, StatusCode, header::LOCATION, redirect::Policy};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;

use super::config::ClientConfig;
use crate::{
    APP_USER_AGENT,
    api::handlers::auth::types::{LoginResponse, MeResponse, SuccessResponse},
    error::{AuthError, ErrorBody},
    principal::Principal,
};

/// Operations the session client needs from the server.
pub trait SessionApi: Send + Sync {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<Principal, AuthError>>;

    fn logout(&self) -> BoxFuture<'_, Result<(), AuthError>>;

    fn current_user(&self) -> BoxFuture<'_, Result<Principal, AuthError>>;

    fn refresh(&self) -> BoxFuture<'_, Result<(), AuthError>>;
}

/// Outcome of a page request made without following redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Page(u16),
    Redirect(String),
}

#[derive(Clone, Debug)]
pub struct HttpSessionApi {
    client: Client,
    base_url: Url,
}

impl HttpSessionApi {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .redirect(Policy::none())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::Transient(format!("invalid url {path}: {e}")))
    }

    /// Request a page and report where the gate sent it.
    ///
    /// # Errors
    /// Returns `Transient` on network failure.
    #[instrument(skip(self))]
    pub async fn navigate(&self, path: &str) -> Result<Navigation, AuthError> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .map_err(transient)?;

        if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string();
            debug!("{path} redirected to {location}");
            return Ok(Navigation::Redirect(location));
        }

        Ok(Navigation::Page(response.status().as_u16()))
    }

    async fn do_login(&self, username: &str, password: &SecretString) -> Result<Principal, AuthError> {
        let response = self
            .client
            .post(self.url("/api/auth/login")?)
            .json(&json!({
                "username": username,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(transient)?;

        let body: LoginResponse = read_json(response).await?;

        checked(body.user)
    }

    async fn do_logout(&self) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.url("/api/auth/logout")?)
            .send()
            .await
            .map_err(transient)?;

        let _: SuccessResponse = read_json(response).await?;
        Ok(())
    }

    async fn do_current_user(&self) -> Result<Principal, AuthError> {
        let response = self
            .client
            .get(self.url("/api/auth/me")?)
            .send()
            .await
            .map_err(transient)?;

        let body: MeResponse = read_json(response).await?;

        checked(body.user)
    }

    async fn do_refresh(&self) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.url("/api/auth/refresh")?)
            .send()
            .await
            .map_err(transient)?;

        let _: SuccessResponse = read_json(response).await?;
        Ok(())
    }
}

impl SessionApi for HttpSessionApi {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<Principal, AuthError>> {
        self.do_login(username, password).boxed()
    }

    fn logout(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        self.do_logout().boxed()
    }

    fn current_user(&self) -> BoxFuture<'_, Result<Principal, AuthError>> {
        self.do_current_user().boxed()
    }

    fn refresh(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        self.do_refresh().boxed()
    }
}

fn transient(err: reqwest::Error) -> AuthError {
    AuthError::Transient(err.to_string())
}

/// The server's principal is validated again before it reaches the cache.
fn checked(principal: Principal) -> Result<Principal, AuthError> {
    principal.validated().map_err(|e| {
        debug!("server returned a malformed principal: {e}");
        AuthError::Unauthorized
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
    let status = response.status();

    if status.is_success() {
        return response.json::<T>().await.map_err(transient);
    }

    let body = response.json::<ErrorBody>().await.ok();
    match (status, body) {
        (_, Some(body)) => Err(AuthError::from_code(&body.code, &body.message)),
        (status, None) if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
            Err(AuthError::Transient(format!("server answered {status}")))
        }
        _ => Err(AuthError::Unauthorized),
    }
}
