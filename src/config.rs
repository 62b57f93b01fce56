//! Server-side auth configuration.

use std::{fmt, str::FromStr, time::Duration};
use url::Url;

const DEFAULT_ACCESS_WINDOW: Duration = Duration::from_secs(30 * 60);
const DEFAULT_RENEWAL_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_HOME_PATH: &str = "/";
const DEFAULT_DASHBOARD_PATH: &str = "/dashboard";
const DEFAULT_RETURN_PARAM: &str = "redirect";

/// Deployment environment. Production turns on `Secure` cookies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    validator_url: Url,
    environment: Environment,
    access_window: Duration,
    renewal_window: Duration,
    request_timeout: Duration,
    public_paths: Vec<String>,
    guest_only_paths: Vec<String>,
    bypass_prefixes: Vec<String>,
    login_path: String,
    dashboard_path: String,
    return_param: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(validator_url: Url) -> Self {
        Self {
            validator_url,
            environment: Environment::default(),
            access_window: DEFAULT_ACCESS_WINDOW,
            renewal_window: DEFAULT_RENEWAL_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            public_paths: vec![DEFAULT_LOGIN_PATH.to_string(), DEFAULT_HOME_PATH.to_string()],
            guest_only_paths: vec![DEFAULT_LOGIN_PATH.to_string()],
            bypass_prefixes: vec![
                "/api/".to_string(),
                "/health".to_string(),
                "/static/".to_string(),
                "/favicon.ico".to_string(),
            ],
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            dashboard_path: DEFAULT_DASHBOARD_PATH.to_string(),
            return_param: DEFAULT_RETURN_PARAM.to_string(),
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_access_window(mut self, window: Duration) -> Self {
        self.access_window = window;
        self
    }

    #[must_use]
    pub fn with_renewal_window(mut self, window: Duration) -> Self {
        self.renewal_window = window;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = paths;
        self
    }

    #[must_use]
    pub fn with_guest_only_paths(mut self, paths: Vec<String>) -> Self {
        self.guest_only_paths = paths;
        self
    }

    #[must_use]
    pub fn with_dashboard_path(mut self, path: String) -> Self {
        self.dashboard_path = path;
        self
    }

    #[must_use]
    pub fn validator_url(&self) -> &Url {
        &self.validator_url
    }

    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment
    }

    #[must_use]
    pub fn access_window(&self) -> Duration {
        self.access_window
    }

    #[must_use]
    pub fn renewal_window(&self) -> Duration {
        self.renewal_window
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Access window in whole minutes, as the validator expects it.
    #[must_use]
    pub fn access_window_minutes(&self) -> u64 {
        (self.access_window.as_secs() / 60).max(1)
    }

    #[must_use]
    pub fn public_paths(&self) -> &[String] {
        &self.public_paths
    }

    #[must_use]
    pub fn guest_only_paths(&self) -> &[String] {
        &self.guest_only_paths
    }

    #[must_use]
    pub fn bypass_prefixes(&self) -> &[String] {
        &self.bypass_prefixes
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }

    #[must_use]
    pub fn return_param(&self) -> &str {
        &self.return_param
    }

    pub(crate) fn cookies_secure(&self) -> bool {
        self.environment.is_production()
    }
}
