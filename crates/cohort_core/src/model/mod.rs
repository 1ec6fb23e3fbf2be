//! Diagram domain model.
//!
//! # Responsibility
//! - Define the box/connection/document records every view projects from.
//! - Generate stable box identities and the built-in starter document.
//!
//! # Invariants
//! - Every box is identified by a stable `BoxId`.
//! - Validation reports problems; it never rewrites the document.

pub mod diagram;
pub mod identity;
pub mod template;
