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
use crate::error::ErrorBody;

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Both secrets rotated", body = SuccessResponse),
        (status = 401, description = "No session or renewal refused; cookies cleared", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh(headers: HeaderMap, auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let mut jar = auth_state.jar(&headers);

    // Failure already cleared the jar; the response carries the deletions.
    match auth_state.issuer().renew(&mut jar).await {
        Ok(()) => with_session(&jar, (StatusCode::OK, Json(SuccessResponse::OK))),
        Err(err) => with_session(&jar, err),
    }
}
