//! Authentication module
//!
//! Supports: API Key (header or query), Basic, Bearer
//!
//! An [`Auth`] is attached to a broker for every request, or to a single
//! call where it replaces the broker-level one. Secret parts are held as
//! `SecretString` so they stay out of `Debug` output.

mod types;

pub use types::{Auth, Location};
