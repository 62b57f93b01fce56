//! Client session state: an advisory mirror of "who is signed in".
//!
//! Holds public principal data only; secrets stay in `HttpOnly` cookies. The
//! state is never consulted for access decisions. Readers subscribe through a
//! watch channel; only the session client writes.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::principal::Principal;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub principal: Option<Principal>,
    pub initialized: bool,
    /// Bumped on every login, sign-out or change of principal.
    #[serde(skip)]
    generation: u64,
}

impl SessionSnapshot {
    #[must_use]
    pub fn authenticated(&self) -> bool {
        self.principal.is_some()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Debug)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().authenticated()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.tx.borrow().initialized
    }

    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.tx.borrow().principal.clone()
    }

    /// Mirror the server's answer. A refreshed profile of the same principal
    /// keeps the current generation.
    pub(crate) fn set_principal(&self, principal: Principal) {
        self.tx.send_if_modified(|state| {
            if state.principal.as_ref() == Some(&principal) {
                return false;
            }
            if state.principal.as_ref().map(|current| current.id) != Some(principal.id) {
                state.generation += 1;
            }
            state.principal = Some(principal);
            true
        });
    }

    /// A new session, even for the principal already shown.
    pub(crate) fn start_session(&self, principal: Principal) {
        self.tx.send_modify(|state| {
            state.generation += 1;
            state.principal = Some(principal);
        });
    }

    pub(crate) fn clear(&self) {
        self.tx.send_if_modified(|state| {
            if state.principal.take().is_none() {
                return false;
            }
            state.generation += 1;
            true
        });
    }

    /// Flip `initialized` to true. Returns false if it already was.
    pub(crate) fn mark_initialized(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.initialized {
                return false;
            }
            state.initialized = true;
            true
        })
    }
}
