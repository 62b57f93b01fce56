use futures::{FutureExt, future::BoxFuture};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{CredentialValidator, Issued, Operation, ValidatorError};
use crate::{
    APP_USER_AGENT,
    config::AuthConfig,
    principal::Principal,
    session::{CredentialPair, is_cookie_safe},
};

/// Validator speaking the DummyJSON `/auth` protocol.
#[derive(Clone, Debug)]
pub struct HttpValidator {
    client: Client,
    base_url: Url,
    expires_in_mins: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(flatten)]
    principal: Principal,
    #[serde(flatten)]
    pair: PairResponse,
}

impl HttpValidator {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.validator_url().clone(),
            expires_in_mins: config.access_window_minutes(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, ValidatorError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let url = base
            .join(endpoint)
            .map_err(|e| ValidatorError::Transport(format!("invalid validator url: {e}")))?;

        debug!("endpoint URL: {}", url);

        Ok(url)
    }

    #[instrument(skip(self, password))]
    async fn do_login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Issued, ValidatorError> {
        let url = self.endpoint_url("auth/login")?;
        let payload = json!({
            "username": username,
            "password": password.expose_secret(),
            "expiresInMins": self.expires_in_mins,
        });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let body: LoginResponse = read_json(Operation::Login, response).await?;
        let principal = body
            .principal
            .validated()
            .map_err(|e| ValidatorError::Malformed(e.to_string()))?;

        Ok(Issued {
            principal,
            credentials: into_pair(body.pair)?,
        })
    }

    #[instrument(skip_all)]
    async fn do_renew(&self, renewal: &SecretString) -> Result<CredentialPair, ValidatorError> {
        let url = self.endpoint_url("auth/refresh")?;
        let payload = json!({
            "refreshToken": renewal.expose_secret(),
            "expiresInMins": self.expires_in_mins,
        });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let body: PairResponse = read_json(Operation::Renew, response).await?;

        into_pair(body)
    }

    #[instrument(skip_all)]
    async fn do_identify(&self, access: &SecretString) -> Result<Principal, ValidatorError> {
        let url = self.endpoint_url("auth/me")?;

        let response = self
            .client
            .get(url)
            .bearer_auth(access.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        let principal: Principal = read_json(Operation::Identify, response).await?;

        principal
            .validated()
            .map_err(|e| ValidatorError::Malformed(e.to_string()))
    }
}

impl CredentialValidator for HttpValidator {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<Issued, ValidatorError>> {
        self.do_login(username, password).boxed()
    }

    fn renew<'a>(
        &'a self,
        renewal: &'a SecretString,
    ) -> BoxFuture<'a, Result<CredentialPair, ValidatorError>> {
        self.do_renew(renewal).boxed()
    }

    fn identify<'a>(
        &'a self,
        access: &'a SecretString,
    ) -> BoxFuture<'a, Result<Principal, ValidatorError>> {
        self.do_identify(access).boxed()
    }
}

fn transport_error(err: reqwest::Error) -> ValidatorError {
    if err.is_timeout() {
        ValidatorError::Timeout
    } else {
        ValidatorError::Transport(err.to_string())
    }
}

async fn read_json<T: DeserializeOwned>(
    operation: Operation,
    response: Response,
) -> Result<T, ValidatorError> {
    let status = response.status();

    if !status.is_success() {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let detail = body["message"].as_str().unwrap_or("").to_string();

        warn!("validator rejected {}: {} {}", operation, status, detail);

        return Err(ValidatorError::Rejected {
            operation,
            status: status.as_u16(),
            detail,
        });
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_timeout() {
            ValidatorError::Timeout
        } else {
            ValidatorError::Malformed(e.to_string())
        }
    })
}

fn into_pair(body: PairResponse) -> Result<CredentialPair, ValidatorError> {
    if !is_cookie_safe(&body.access_token) || !is_cookie_safe(&body.refresh_token) {
        return Err(ValidatorError::Malformed(
            "credential pair is not cookie safe".to_string(),
        ));
    }

    Ok(CredentialPair {
        access: SecretString::from(body.access_token),
        renewal: SecretString::from(body.refresh_token),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn validator(base: &str) -> HttpValidator {
        HttpValidator::new(&AuthConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn endpoint_url_keeps_base_path() {
        let v = validator("https://dummyjson.com");
        assert_eq!(
            v.endpoint_url("auth/login").unwrap().as_str(),
            "https://dummyjson.com/auth/login"
        );

        let v = validator("http://127.0.0.1:9000/v1");
        assert_eq!(
            v.endpoint_url("auth/refresh").unwrap().as_str(),
            "http://127.0.0.1:9000/v1/auth/refresh"
        );
    }

    #[test]
    fn expires_in_follows_access_window() {
        let v = validator("https://dummyjson.com");
        assert_eq!(v.expires_in_mins, 30);
    }

    #[test]
    fn login_response_splits_principal_and_pair() {
        let json = json!({
            "id": 1,
            "username": "emilys",
            "email": "emily.johnson@x.dummyjson.com",
            "firstName": "Emily",
            "lastName": "Johnson",
            "gender": "female",
            "image": "https://dummyjson.com/icon/emilys/128",
            "accessToken": "a1",
            "refreshToken": "r1"
        });
        let body: LoginResponse = serde_json::from_value(json).unwrap();
        assert_eq!(body.principal.username, "emilys");
        let pair = into_pair(body.pair).unwrap();
        assert_eq!(pair.access.expose_secret(), "a1");
        assert_eq!(pair.renewal.expose_secret(), "r1");
    }

    #[test]
    fn pair_with_unsafe_characters_is_malformed() {
        let err = into_pair(PairResponse {
            access_token: "a 1".to_string(),
            refresh_token: "r1".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, ValidatorError::Malformed(_)));
    }
}
