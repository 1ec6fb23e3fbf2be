//! Persistence codecs for diagram documents.
//!
//! # Invariants
//! - Decoding replaces a document wholesale; there is no merge path.
//! - Malformed input is reported, never half-applied.

pub mod json;
