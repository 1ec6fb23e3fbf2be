//! Core diagram logic for the cohort diagram editor.
//! This crate is the single source of truth for document invariants.

pub mod adapter;
pub mod codec;
pub mod config;
pub mod logging;
pub mod model;
pub mod service;

pub use adapter::form::{
    export_connections_text, export_rows, import_connections_text, import_rows,
    parse_connections_text, ConnectionsImport, FormImportReport, FormRow, FormWarning,
    ParsedConnections, RejectedLine,
};
pub use adapter::graph::{
    build_render_graph, to_dot, GraphOptions, RenderEdge, RenderGraph, RenderNode,
};
pub use adapter::spatial::{
    export_shapes, import_shapes, place_unplaced, ShapeDescriptor, SpatialImportReport,
    SpatialLayout,
};
pub use codec::json::{decode, encode, CodecError, CodecResult, DecodedDocument};
pub use config::{default_log_level, EditorConfig, LogConfig};
pub use logging::{init_logging, logging_status, LoggingError};
pub use model::diagram::{
    validate, BoxId, Connection, DiagramBox, Document, DocumentViolation, Endpoint, Geometry,
};
pub use model::identity::{fresh_box_id, new_box_id};
pub use service::mutation::{
    add_box, apply, remove_box, set_connections, update_box_fields, BoxPatch, EditOp,
    EditOutcome, MutationError, MutationResult, NewBox,
};
pub use service::session::EditorSession;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
