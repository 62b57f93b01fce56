use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::debug;

use super::{
    state::{AuthState, with_session},
    types::{LoginRequest, LoginResponse},
};
use crate::error::{AuthError, ErrorBody};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued; secrets set as HttpOnly cookies", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!("Rejected login body: {rejection}");
            return AuthError::InvalidCredentials("Invalid request body".to_string())
                .into_response();
        }
    };

    let mut jar = auth_state.jar(&headers);
    let password = SecretString::from(request.password);

    match auth_state
        .issuer()
        .login(&mut jar, &request.username, &password)
        .await
    {
        Ok(user) => with_session(
            &jar,
            (
                StatusCode::OK,
                Json(LoginResponse {
                    user,
                    success: true,
                }),
            ),
        ),
        Err(err) => err.into_response(),
    }
}
