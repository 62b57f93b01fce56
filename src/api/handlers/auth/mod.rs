//! Auth endpoints.
//!
//! All four endpoints read the session from the `access`/`renewal` cookies and
//! write it back through `Set-Cookie`. Secrets never appear in a body.
//!
//! - `POST /api/auth/login` issues a session.
//! - `POST /api/auth/logout` clears it unconditionally.
//! - `GET /api/auth/me` resolves the access secret to a principal.
//! - `POST /api/auth/refresh` rotates both secrets, or clears them on failure.

pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod me;
pub(crate) mod refresh;
mod state;
pub(crate) mod types;

pub use state::AuthState;
