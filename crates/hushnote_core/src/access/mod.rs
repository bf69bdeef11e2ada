//! Access control for private notes.
//!
//! # Responsibility
//! - Wrap the external device authenticator behind a small capability trait.
//! - Track session permissions that gate private-note reads and lock toggles.

pub mod authenticator;
pub mod session;
