//! Client side of the session: an advisory cache of the signed-in principal,
//! kept in step with the server, plus proactive renewal.
//!
//! Nothing here decides access. The server's gate does; this module only
//! mirrors its answers so a UI can render without flashing the wrong state.

pub mod api;
mod config;
pub mod scheduler;
pub mod session;
pub mod state;

pub use api::{HttpSessionApi, Navigation, SessionApi};
pub use config::{ClientConfig, ClientConfigError, interval_for};
pub use scheduler::{RenewalPhase, RenewalScheduler};
pub use session::SessionClient;
pub use state::{SessionSnapshot, SessionState};
