//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and session calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod note_service;
