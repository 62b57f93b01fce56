use crate::{
    api,
    cli::telemetry,
    config::{AuthConfig, Environment},
};
use anyhow::Result;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub validator_url: Url,
    pub environment: Environment,
    pub access_window_minutes: u64,
    pub renewal_window_days: u64,
    pub request_timeout_seconds: u64,
}

impl Args {
    #[must_use]
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.validator_url.clone())
            .with_environment(self.environment)
            .with_access_window(Duration::from_secs(self.access_window_minutes * 60))
            .with_renewal_window(Duration::from_secs(self.renewal_window_days * 24 * 60 * 60))
            .with_request_timeout(Duration::from_secs(self.request_timeout_seconds))
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the validator client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let result = api::new(args.port, args.auth_config()).await;

    telemetry::shutdown_tracer();

    result
}
