use crate::{
    api::handlers::{auth::AuthState, pages},
    config::AuthConfig,
    gate::{self, AccessGate},
    validator::HttpValidator,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Full application: documented API routes, gated pages, tracing layers.
#[must_use]
pub fn app(auth_state: Arc<AuthState>) -> Router {
    let access_gate = Arc::new(AccessGate::from_config(auth_state.config()));

    let (router, _openapi) = router().split_for_parts();
    router
        .merge(pages::router())
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(access_gate, gate::enforce))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, config: AuthConfig) -> Result<()> {
    let validator = HttpValidator::new(&config).context("Failed to build validator client")?;

    info!("Credential validator: {}", config.validator_url());

    let auth_state = Arc::new(AuthState::new(config, Arc::new(validator)));

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app(auth_state).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::issuer::tests::StubValidator;
    use axum::http::{StatusCode, header::LOCATION};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = AuthConfig::new(url::Url::parse("https://dummyjson.com").unwrap());
        app(Arc::new(AuthState::new(
            config,
            Arc::new(StubValidator::default()),
        )))
    }

    async fn get(app: Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn guarded_page_redirects_without_session() {
        let response = get(test_app(), "/dashboard/images", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/login?redirect=%2Fdashboard%2Fimages"
        );
    }

    #[tokio::test]
    async fn guarded_page_served_with_session() {
        let response = get(test_app(), "/dashboard", Some("access=access-0")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_page_redirects_authenticated_user() {
        let response = get(test_app(), "/login", Some("access=access-0")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/dashboard");
    }

    #[tokio::test]
    async fn unknown_guarded_path_redirects_before_404() {
        let response = get(test_app(), "/dashboard/unknown", None).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let response = get(test_app(), "/dashboard/unknown", Some("access=a")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_routes_answer_json_not_redirects() {
        let response = get(test_app(), "/api/auth/me", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_is_public_and_tagged() {
        let response = get(test_app(), "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-app"));
        assert!(response.headers().contains_key("x-request-id"));
    }
}
