//! View adapters between the document and its external surfaces.
//!
//! # Responsibility
//! - `form`: tabular rows and connection text.
//! - `spatial`: draggable canvas rectangles.
//! - `graph`: one-way directed-graph rendering request.
//!
//! # Invariants
//! - Adapters take the document as a parameter; none holds ambient state.
//! - Every write goes through `service::mutation`.

pub mod form;
pub mod graph;
pub mod spatial;
