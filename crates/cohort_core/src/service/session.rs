//! Editing session use-case service.
//!
//! # Responsibility
//! - Own exactly one document for the lifetime of an editing session.
//! - Route every view interaction through the matching adapter.
//! - Replace the document atomically on load.
//!
//! # Invariants
//! - Adapters receive the document by reference; no ambient state.
//! - A failed load or save leaves the current document unchanged.

use crate::adapter::form::{
    export_connections_text, export_rows, import_connections_text, import_rows,
    ConnectionsImport, FormImportReport, FormRow,
};
use crate::adapter::graph::{build_render_graph, to_dot, RenderGraph};
use crate::adapter::spatial::{
    export_shapes, import_shapes, ShapeDescriptor, SpatialImportReport,
};
use crate::codec::json::{self, CodecResult};
use crate::config::EditorConfig;
use crate::model::diagram::{DiagramBox, Document, DocumentViolation};
use crate::service::mutation::{
    add_box, remove_box, update_box_fields, BoxPatch, MutationResult, NewBox,
};
use log::{error, info, warn};
use std::path::Path;

/// Session owner of one diagram document.
#[derive(Debug, Clone)]
pub struct EditorSession {
    document: Document,
    config: EditorConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// Starts a session on the built-in starter diagram.
    pub fn new() -> Self {
        Self::with_config(Document::default_template(), EditorConfig::default())
    }

    /// Starts a session on an existing document.
    pub fn from_document(document: Document) -> Self {
        Self::with_config(document, EditorConfig::default())
    }

    pub fn with_config(document: Document, config: EditorConfig) -> Self {
        info!(
            "event=session_start module=session status=ok boxes={} connections={}",
            document.boxes.len(),
            document.connections.len()
        );
        Self { document, config }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Ends the session, handing the document to the caller.
    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.document.title = title.into();
    }

    /// Discards the current document and starts over from the template.
    pub fn reset_to_template(&mut self) {
        self.document = Document::default_template();
        info!("event=session_reset module=session status=ok");
    }

    pub fn validate(&self) -> Vec<DocumentViolation> {
        self.document.validate()
    }

    pub fn add_box(&mut self, new_box: NewBox) -> DiagramBox {
        add_box(&mut self.document, new_box)
    }

    pub fn remove_box(&mut self, id: &str) -> MutationResult<DiagramBox> {
        remove_box(&mut self.document, id)
    }

    pub fn update_box(&mut self, id: &str, patch: BoxPatch) -> MutationResult<()> {
        update_box_fields(&mut self.document, id, patch)
    }

    pub fn form_rows(&self) -> Vec<FormRow> {
        export_rows(&self.document)
    }

    pub fn apply_form_rows(&mut self, rows: &[FormRow]) -> FormImportReport {
        import_rows(&mut self.document, rows)
    }

    pub fn connections_text(&self) -> String {
        export_connections_text(&self.document)
    }

    pub fn apply_connections_text(&mut self, text: &str) -> ConnectionsImport {
        import_connections_text(&mut self.document, text)
    }

    /// Exports canvas shapes, placing any unplaced boxes first.
    pub fn canvas_shapes(&mut self) -> Vec<ShapeDescriptor> {
        export_shapes(&mut self.document, &self.config.layout)
    }

    pub fn apply_canvas_shapes(&mut self, shapes: &[ShapeDescriptor]) -> SpatialImportReport {
        import_shapes(&mut self.document, shapes)
    }

    pub fn render_graph(&self) -> RenderGraph {
        build_render_graph(&self.document, &self.config.graph)
    }

    pub fn render_dot(&self) -> String {
        to_dot(&self.render_graph())
    }

    /// Encodes the current document for download.
    pub fn save(&self) -> CodecResult<String> {
        json::encode(&self.document)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> CodecResult<()> {
        json::save_to_path(&self.document, path)
    }

    /// Decodes `input` and replaces the whole document with it.
    ///
    /// Returns non-fatal violations of the loaded document. On error the
    /// current document is kept.
    pub fn load(&mut self, input: &str) -> CodecResult<Vec<DocumentViolation>> {
        match json::decode(input) {
            Ok(decoded) => Ok(self.replace(decoded)),
            Err(err) => {
                error!(
                    "event=session_load module=session status=error error_code=decode_failed error={}",
                    err
                );
                Err(err)
            }
        }
    }

    pub fn load_from_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> CodecResult<Vec<DocumentViolation>> {
        let decoded = json::load_from_path(path)?;
        Ok(self.replace(decoded))
    }

    fn replace(&mut self, decoded: json::DecodedDocument) -> Vec<DocumentViolation> {
        self.document = decoded.document;
        if decoded.violations.is_empty() {
            info!(
                "event=session_load module=session status=ok boxes={}",
                self.document.boxes.len()
            );
        } else {
            warn!(
                "event=session_load module=session status=warn boxes={} violations={}",
                self.document.boxes.len(),
                decoded.violations.len()
            );
        }
        decoded.violations
    }
}
