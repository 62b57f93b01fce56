use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{state::AuthState, types::MeResponse};
use crate::error::ErrorBody;

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "No valid access secret", body = ErrorBody),
        (status = 503, description = "Validator unreachable; retry once", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let jar = auth_state.jar(&headers);

    match auth_state.issuer().current_principal(&jar).await {
        Ok(user) => (StatusCode::OK, Json(MeResponse { user })).into_response(),
        Err(err) => err.into_response(),
    }
}
