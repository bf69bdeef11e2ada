//! Query and filter engine over the in-memory note collection.
//!
//! # Responsibility
//! - Derive partitioned, sorted and searched views without mutating notes.

pub mod query;
