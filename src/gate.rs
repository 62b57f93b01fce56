//! Access Gate: per-request routing decision from path and session presence.
//!
//! The decision is a pure function. Presence is existence-only; the access
//! secret is never decoded here, the validator judges it when it is used.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

use crate::{config::AuthConfig, session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin { return_to: String },
    RedirectToDashboard,
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    public_paths: Vec<String>,
    guest_only_paths: Vec<String>,
    bypass_prefixes: Vec<String>,
    login_path: String,
    dashboard_path: String,
    return_param: String,
}

impl AccessGate {
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            public_paths: config.public_paths().to_vec(),
            guest_only_paths: config.guest_only_paths().to_vec(),
            bypass_prefixes: config.bypass_prefixes().to_vec(),
            login_path: config.login_path().to_string(),
            dashboard_path: config.dashboard_path().to_string(),
            return_param: config.return_param().to_string(),
        }
    }

    /// Paths the gate never evaluates: API routes and static assets.
    ///
    /// An entry matches itself and anything below it, never a longer sibling:
    /// `/health` covers `/health/ready` but not `/health-report`.
    #[must_use]
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        let path = normalize(path);
        self.public_paths.iter().any(|p| normalize(p) == path)
    }

    fn is_guest_only(&self, path: &str) -> bool {
        let path = normalize(path);
        self.guest_only_paths.iter().any(|p| normalize(p) == path)
    }

    #[must_use]
    pub fn decide(&self, path: &str, session_present: bool) -> Decision {
        if self.is_bypassed(path) {
            return Decision::Allow;
        }

        if session_present && self.is_guest_only(path) {
            return Decision::RedirectToDashboard;
        }

        if !session_present && !self.is_public(path) {
            return Decision::RedirectToLogin {
                return_to: normalize(path).to_string(),
            };
        }

        Decision::Allow
    }

    /// Login location carrying the return target, e.g. `/login?redirect=%2Fdashboard`.
    #[must_use]
    pub fn login_location(&self, return_to: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(return_to.as_bytes()).collect();
        format!("{}?{}={}", self.login_path, self.return_param, encoded)
    }

    #[must_use]
    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Middleware applying the gate before any page handler runs.
pub async fn enforce(State(gate): State<Arc<AccessGate>>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let present = session::access_present(request.headers());

    match gate.decide(&path, present) {
        Decision::Allow => next.run(request).await,
        Decision::RedirectToLogin { return_to } => {
            debug!("no session for {path}, redirecting to login");
            Redirect::temporary(&gate.login_location(&return_to)).into_response()
        }
        Decision::RedirectToDashboard => {
            debug!("session present on {path}, redirecting to dashboard");
            Redirect::temporary(gate.dashboard_path()).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gate() -> AccessGate {
        AccessGate::from_config(&AuthConfig::new(
            url::Url::parse("https://dummyjson.com").unwrap(),
        ))
    }

    #[test]
    fn guarded_path_without_session_redirects_to_login() {
        assert_eq!(
            gate().decide("/dashboard/settings", false),
            Decision::RedirectToLogin {
                return_to: "/dashboard/settings".to_string()
            }
        );
    }

    #[test]
    fn guarded_path_with_session_is_allowed() {
        assert_eq!(gate().decide("/dashboard", true), Decision::Allow);
    }

    #[test]
    fn login_page_with_session_redirects_to_dashboard() {
        assert_eq!(gate().decide("/login", true), Decision::RedirectToDashboard);
        assert_eq!(gate().decide("/login/", true), Decision::RedirectToDashboard);
    }

    #[test]
    fn public_pages_without_session_are_allowed() {
        assert_eq!(gate().decide("/login", false), Decision::Allow);
        assert_eq!(gate().decide("/", false), Decision::Allow);
    }

    #[test]
    fn home_with_session_is_allowed() {
        assert_eq!(gate().decide("/", true), Decision::Allow);
    }

    #[test]
    fn api_and_static_paths_bypass_the_gate() {
        let gate = gate();
        assert_eq!(gate.decide("/api/auth/me", false), Decision::Allow);
        assert_eq!(gate.decide("/health", false), Decision::Allow);
        assert_eq!(gate.decide("/static/app.css", false), Decision::Allow);
        assert_eq!(gate.decide("/favicon.ico", false), Decision::Allow);
        assert!(!gate.is_bypassed("/apikeys"));
    }

    #[test]
    fn bypass_stops_at_path_boundaries() {
        let gate = gate();
        assert!(gate.is_bypassed("/api"));
        assert!(gate.is_bypassed("/health/ready"));
        assert!(!gate.is_bypassed("/health-report"));
        assert!(!gate.is_bypassed("/healthz-admin"));
        assert!(!gate.is_bypassed("/favicon.ico.bak"));
        assert!(!gate.is_bypassed("/staticfiles"));
        assert_eq!(
            gate.decide("/health-report", false),
            Decision::RedirectToLogin {
                return_to: "/health-report".to_string()
            }
        );
    }

    #[test]
    fn trailing_slash_is_normalized() {
        assert_eq!(
            gate().decide("/dashboard/", false),
            Decision::RedirectToLogin {
                return_to: "/dashboard".to_string()
            }
        );
    }

    #[test]
    fn login_location_encodes_return_target() {
        assert_eq!(
            gate().login_location("/dashboard/profile"),
            "/login?redirect=%2Fdashboard%2Fprofile"
        );
    }

    #[test]
    fn decision_depends_only_on_inputs() {
        let gate = gate();
        for path in ["/", "/login", "/dashboard", "/dashboard/images", "/api/auth/login"] {
            for present in [true, false] {
                assert_eq!(gate.decide(path, present), gate.decide(path, present));
            }
        }
    }
}
