//! Shared harness: a stand-in credential validator and an in-process gateway,
//! both listening on ephemeral loopback ports.

#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use tokio::net::TcpListener;
use tollgate::{
    api::{self, handlers::auth::AuthState},
    client::{ClientConfig, HttpSessionApi, SessionApi, SessionClient},
    config::AuthConfig,
    validator::HttpValidator,
};
use url::Url;

pub const USERNAME: &str = "emilys";
pub const PASSWORD: &str = "emilyspass";

/// Validator state. Every login or renewal issues generation `n + 1` and
/// retires the previous pair.
#[derive(Default)]
pub struct Stub {
    generation: Mutex<usize>,
    pub fail_refresh: AtomicBool,
    pub refresh_calls: AtomicUsize,
}

impl Stub {
    pub fn generation(&self) -> usize {
        *self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue(&self) -> Value {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        json!({
            "accessToken": format!("access-{generation}"),
            "refreshToken": format!("renewal-{generation}"),
        })
    }

    fn current(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.generation())
    }
}

fn profile() -> Value {
    json!({
        "id": 1,
        "username": USERNAME,
        "email": "emily.johnson@x.dummyjson.com",
        "firstName": "Emily",
        "lastName": "Johnson",
        "gender": "female",
        "image": "https://dummyjson.com/icon/emilys/128",
    })
}

fn rejected(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn login(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    if body["username"] != USERNAME || body["password"] != PASSWORD {
        return rejected(StatusCode::BAD_REQUEST, "Invalid credentials");
    }

    let mut response = profile();
    if let (Some(fields), Value::Object(pair)) = (response.as_object_mut(), stub.issue()) {
        fields.extend(pair);
    }
    Json(response).into_response()
}

async fn refresh(State(stub): State<Arc<Stub>>, Json(body): Json<Value>) -> Response {
    stub.refresh_calls.fetch_add(1, Ordering::SeqCst);

    if stub.fail_refresh.load(Ordering::SeqCst) || body["refreshToken"] != stub.current("renewal") {
        return rejected(StatusCode::UNAUTHORIZED, "Invalid refresh token");
    }

    Json(stub.issue()).into_response()
}

async fn me(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    let expected = format!("Bearer {}", stub.current("access"));
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Json(profile()).into_response(),
        _ => rejected(StatusCode::UNAUTHORIZED, "Token Expired!"),
    }
}

async fn serve(router: Router) -> Result<Url> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .context("bind loopback")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(Url::parse(&format!("http://{addr}/"))?)
}

pub async fn spawn_validator() -> Result<(Arc<Stub>, Url)> {
    let stub = Arc::new(Stub::default());
    let router = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .with_state(Arc::clone(&stub));

    Ok((stub, serve(router).await?))
}

pub async fn spawn_gateway(validator_url: Url) -> Result<Url> {
    let config = AuthConfig::new(validator_url);
    let validator = HttpValidator::new(&config)?;
    let auth_state = Arc::new(AuthState::new(config, Arc::new(validator)));

    serve(api::app(auth_state)).await
}

pub struct Harness {
    pub stub: Arc<Stub>,
    pub gateway: Url,
    pub http: Arc<HttpSessionApi>,
    pub client: Arc<SessionClient>,
}

impl Harness {
    pub async fn new() -> Result<Self> {
        let (stub, validator_url) = spawn_validator().await?;
        let gateway = spawn_gateway(validator_url).await?;

        let config = ClientConfig::new(gateway.clone());
        let http = Arc::new(HttpSessionApi::new(&config)?);
        let api: Arc<dyn SessionApi> = Arc::clone(&http) as Arc<dyn SessionApi>;
        let client = Arc::new(SessionClient::new(api, config));

        Ok(Self {
            stub,
            gateway,
            http,
            client,
        })
    }
}
