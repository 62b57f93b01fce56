//! Placeholder pages. They exist so the access gate has something to guard;
//! the markup carries no data.

use axum::{
    Router,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse},
    routing::get,
};

pub(crate) fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/profile", get(profile))
        .route("/dashboard/settings", get(settings))
        .route("/dashboard/images", get(images))
}

fn render(title: &str) -> Html<String> {
    Html(format!(
        "<!doctype html><html><head><title>{title}</title></head><body><h1>{title}</h1></body></html>"
    ))
}

pub async fn home() -> Html<String> {
    render("Home")
}

pub async fn login() -> Html<String> {
    render("Sign in")
}

pub async fn dashboard() -> Html<String> {
    render("Dashboard")
}

pub async fn profile() -> Html<String> {
    render("Profile")
}

pub async fn settings() -> Html<String> {
    render("Settings")
}

pub async fn images() -> Html<String> {
    render("Images")
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}
