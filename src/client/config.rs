use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(5 * 60);
const DEFAULT_ACCESS_WINDOW: Duration = Duration::from_secs(30 * 60);
const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientConfigError {
    #[error(
        "renewal interval must be shorter than the access window ({access_window:?}) and non-zero, got margin {safety_margin:?}"
    )]
    InvalidRenewalInterval {
        access_window: Duration,
        safety_margin: Duration,
    },
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: Url,
    request_timeout: Duration,
    staleness_window: Duration,
    access_window: Duration,
    safety_margin: Duration,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            staleness_window: DEFAULT_STALENESS_WINDOW,
            access_window: DEFAULT_ACCESS_WINDOW,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = window;
        self
    }

    #[must_use]
    pub fn with_access_window(mut self, window: Duration) -> Self {
        self.access_window = window;
        self
    }

    #[must_use]
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn staleness_window(&self) -> Duration {
        self.staleness_window
    }

    /// Delay between proactive renewals.
    ///
    /// # Errors
    /// Fails unless `0 < access_window - safety_margin < access_window`.
    pub fn renewal_interval(&self) -> Result<Duration, ClientConfigError> {
        interval_for(self.access_window, self.safety_margin)
    }
}

/// Renewal delay for a given access window and safety margin.
///
/// # Errors
/// Fails when the result would be zero or not strictly inside the window.
pub fn interval_for(access_window: Duration, safety_margin: Duration) -> Result<Duration, ClientConfigError> {
    match access_window.checked_sub(safety_margin) {
        Some(interval) if !interval.is_zero() && interval < access_window => Ok(interval),
        _ => Err(ClientConfigError::InvalidRenewalInterval {
            access_window,
            safety_margin,
        }),
    }
}
