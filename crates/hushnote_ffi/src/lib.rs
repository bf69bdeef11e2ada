//! Flutter-facing bindings for the HushNote core.

pub mod api;
