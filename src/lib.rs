//! # Tollgate (session gateway)
//!
//! `tollgate` sits between a browser and an external credential validator. It
//! exchanges a username and password for a credential pair, keeps both secrets
//! in `HttpOnly` cookies and never hands them to script.
//!
//! ## Credentials
//!
//! - **Access secret:** short lived, presented to the validator to learn who
//!   the caller is. Its cookie lives for the access window (30 minutes by
//!   default).
//! - **Renewal secret:** long lived (7 days by default), traded for a fresh
//!   pair. Both cookies are replaced together on every renewal.
//!
//! ## Route gating
//!
//! Every page request passes through [`gate`]. It looks only for the presence
//! of the access cookie: protected pages without one redirect to `/login`
//! carrying the original path, and `/login` with one redirects to the
//! dashboard. API routes, health and static assets bypass the gate.
//!
//! ## Client
//!
//! [`client`] keeps an advisory copy of the signed-in principal in step with
//! the server, revalidates it when stale and renews the session before the
//! access secret expires.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod issuer;
pub mod principal;
pub mod session;
pub mod singleflight;
pub mod validator;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
