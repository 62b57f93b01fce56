//! Proactive renewal: refresh the session before the access secret expires.
//!
//! One supervisor task follows the session state. Signing in arms a single
//! timer; signing out, or any other loss of the session, cancels it. The
//! timer refreshes every interval until a refresh fails.
//!
//! Phases: `Idle -> Scheduled -> Fired -> Scheduled | Idle`.

use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use super::{config::ClientConfigError, session::SessionClient};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenewalPhase {
    Idle,
    Scheduled,
    Fired,
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct RenewalScheduler {
    phase: watch::Receiver<RenewalPhase>,
    _supervisor: AbortOnDrop,
}

impl RenewalScheduler {
    /// Start with the interval derived from the client's configuration.
    ///
    /// # Errors
    /// Fails if the configured interval is not inside the access window.
    pub fn start(client: Arc<SessionClient>) -> Result<Self, ClientConfigError> {
        let interval = client.config().renewal_interval()?;
        Ok(Self::with_interval(client, interval))
    }

    #[must_use]
    pub fn with_interval(client: Arc<SessionClient>, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(RenewalPhase::Idle);
        let supervisor = tokio::spawn(supervise(client, interval, Arc::new(tx)));

        Self {
            phase: rx,
            _supervisor: AbortOnDrop(supervisor),
        }
    }

    #[must_use]
    pub fn phase(&self) -> RenewalPhase {
        *self.phase.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RenewalPhase> {
        self.phase.clone()
    }
}

async fn supervise(
    client: Arc<SessionClient>,
    interval: Duration,
    phase: Arc<watch::Sender<RenewalPhase>>,
) {
    let mut session = client.state().subscribe();
    let (mut seen, authenticated) = {
        let snapshot = session.borrow_and_update();
        (snapshot.generation(), snapshot.authenticated())
    };
    let mut timer = authenticated.then(|| arm(&client, interval, &phase));

    while session.changed().await.is_ok() {
        let (generation, authenticated) = {
            let snapshot = session.borrow_and_update();
            (snapshot.generation(), snapshot.authenticated())
        };
        if generation == seen {
            continue;
        }
        seen = generation;

        // Cancel before re-arming so two timers never overlap.
        drop(timer.take());
        if authenticated {
            timer = Some(arm(&client, interval, &phase));
        } else {
            phase.send_replace(RenewalPhase::Idle);
            debug!("session ended, renewal timer cancelled");
        }
    }
}

fn arm(
    client: &Arc<SessionClient>,
    interval: Duration,
    phase: &Arc<watch::Sender<RenewalPhase>>,
) -> AbortOnDrop {
    let client = Arc::clone(client);
    let phase = Arc::clone(phase);

    phase.send_replace(RenewalPhase::Scheduled);
    info!("renewal scheduled every {:?}", interval);

    AbortOnDrop(tokio::spawn(async move {
        loop {
            sleep(interval).await;
            phase.send_replace(RenewalPhase::Fired);

            match client.refresh().await {
                Ok(()) => {
                    debug!("proactive renewal succeeded");
                    phase.send_replace(RenewalPhase::Scheduled);
                }
                Err(err) => {
                    warn!("proactive renewal failed, not re-arming: {err}");
                    phase.send_replace(RenewalPhase::Idle);
                    break;
                }
            }
        }
    }))
}
