//! Core use-case services.
//!
//! # Responsibility
//! - `mutation`: the single write path for boxes and connections.
//! - `session`: owner of one document, routing view interactions to adapters.
//! - Keep UI/FFI layers decoupled from model internals.

pub mod mutation;
pub mod session;
