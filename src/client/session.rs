//! Session client: reconciles [`SessionState`] with the server.
//!
//! The state changes only here. Reconciliation runs once at start-up, after
//! login and logout, after a refresh failure, and whenever the last check is
//! older than the staleness window.

use secrecy::SecretString;
use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{Instant, sleep},
};
use tracing::{debug, info, instrument, warn};

use super::{api::SessionApi, config::ClientConfig, state::SessionState};
use crate::{
    error::{AuthError, Recovery},
    principal::Principal,
    singleflight::SingleFlight,
};

pub struct SessionClient {
    api: Arc<dyn SessionApi>,
    state: SessionState,
    config: ClientConfig,
    started: AtomicBool,
    last_checked: Mutex<Option<Instant>>,
    refreshes: SingleFlight<(), Result<(), AuthError>>,
}

impl SessionClient {
    #[must_use]
    pub fn new(api: Arc<dyn SessionApi>, config: ClientConfig) -> Self {
        Self {
            api,
            state: SessionState::new(),
            config,
            started: AtomicBool::new(false),
            last_checked: Mutex::new(None),
            refreshes: SingleFlight::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// First reconciliation. Only the first call queries the server; the
    /// state is `initialized` once it returns, whatever the outcome.
    pub async fn initialize(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let outcome = self.reconcile().await;
        self.state.mark_initialized();

        match outcome {
            Ok(principal) => info!("session restored for principal {}", principal.id),
            Err(err) => debug!("no session at start-up: {err}"),
        }
    }

    /// Ask the server who is signed in and mirror the answer.
    ///
    /// A transient failure is retried once; any other failure is final.
    ///
    /// # Errors
    /// Returns the failure after the state has been cleared.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<Principal, AuthError> {
        let mut outcome = self.api.current_user().await;
        if matches!(&outcome, Err(err) if err.is_retryable()) {
            debug!("retrying reconciliation after a transient failure");
            outcome = self.api.current_user().await;
        }

        self.touch();

        match outcome {
            Ok(principal) => {
                self.state.set_principal(principal.clone());
                Ok(principal)
            }
            Err(err) => {
                self.state.clear();
                Err(err)
            }
        }
    }

    /// # Errors
    /// Returns the server's refusal; the state is left unchanged.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Principal, AuthError> {
        let principal = self.api.login(username, password).await?;

        self.touch();
        self.state.start_session(principal.clone());

        Ok(principal)
    }

    /// Sign out. Local state is cleared even when the server call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(err) = self.api.logout().await {
            warn!("logout request failed, clearing local session anyway: {err}");
        }
        self.state.clear();
    }

    /// Rotate the server-held pair. Concurrent callers share one request.
    ///
    /// # Errors
    /// Any failure clears the local state before it is returned.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let api = Arc::clone(&self.api);
        let outcome = self.refreshes.run((), async move { api.refresh().await }).await;

        if let Err(err) = &outcome {
            warn!("session refresh failed: {err}");
            self.state.clear();
        }
        outcome
    }

    /// Apply the recovery rule for an error surfaced by any guarded call.
    pub fn handle_error(&self, err: &AuthError) -> Recovery {
        let recovery = err.recovery();
        match recovery {
            Recovery::ReconcileLoggedOut | Recovery::ClearAndRouteToLogin | Recovery::RouteToLogin => {
                self.state.clear();
            }
            Recovery::ShowInline | Recovery::RetryOnce => {}
        }
        recovery
    }

    /// Reconcile if the last check is older than the staleness window.
    /// Returns whether a query was made.
    pub async fn revalidate_if_stale(&self) -> bool {
        if !self.is_stale() {
            return false;
        }
        if let Err(err) = self.reconcile().await {
            debug!("revalidation cleared the session: {err}");
        }
        true
    }

    /// Revalidate whenever the last check reaches the staleness window.
    ///
    /// The wake-up follows the latest check, so a login or reconciliation made
    /// in between moves the next query instead of postponing it a full window.
    pub fn spawn_revalidation(self: &Arc<Self>) -> JoinHandle<()> {
        let client = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                sleep(client.until_stale()).await;
                client.revalidate_if_stale().await;
            }
        })
    }

    fn last_checked(&self) -> Option<Instant> {
        *self
            .last_checked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stale(&self) -> bool {
        self.last_checked()
            .is_none_or(|at| at.elapsed() >= self.config.staleness_window())
    }

    /// Time left before the cache goes stale. A client that has never checked
    /// waits one full window, leaving the first query to `initialize`.
    fn until_stale(&self) -> Duration {
        let window = self.config.staleness_window();
        self.last_checked()
            .map_or(window, |at| window.saturating_sub(at.elapsed()))
    }

    fn touch(&self) {
        *self
            .last_checked
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }
}
