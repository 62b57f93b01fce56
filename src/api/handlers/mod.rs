//! Route handlers: the auth query surface, health, and gated pages.

pub mod auth;
pub mod health;
pub mod pages;
