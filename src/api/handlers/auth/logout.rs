use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{
    state::{AuthState, with_session},
    types::SuccessResponse,
};

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = SuccessResponse)
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let mut jar = auth_state.jar(&headers);

    // Always clear both slots, even when nothing was set.
    auth_state.issuer().logout(&mut jar);

    with_session(&jar, (StatusCode::OK, Json(SuccessResponse::OK)))
}
