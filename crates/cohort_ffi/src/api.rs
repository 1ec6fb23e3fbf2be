//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose one diagram editing session to Dart via FRB.
//! - Move structured values across the boundary as JSON strings.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every session call returns a `SessionResponse` envelope; failures keep
//!   the session document unchanged.

use cohort_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BoxPatch, Document, DocumentViolation, EditorConfig, EditorSession, FormRow, LogConfig,
    NewBox, ShapeDescriptor,
};
use log::warn;
use serde::Serialize;
use serde_json::{json, Value};

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(&LogConfig::new(level, log_dir)) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Same as `init_logging`, reading `COHORT_DIAGRAM_LOG_LEVEL` and
/// `COHORT_DIAGRAM_LOG_DIR` with built-in fallbacks.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging_from_env() -> String {
    match init_logging_inner(&LogConfig::from_env()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Response envelope for every session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable message for diagnostics/UI. Empty on plain success.
    pub message: String,
    /// JSON payload; `None` on failure.
    pub payload: Option<String>,
}

impl SessionResponse {
    fn success(payload: Value) -> Self {
        Self {
            ok: true,
            message: String::new(),
            payload: Some(payload.to_string()),
        }
    }

    fn success_with_message(message: impl Into<String>, payload: Value) -> Self {
        Self {
            ok: true,
            message: message.into(),
            payload: Some(payload.to_string()),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!("event=ffi_call module=ffi status=error error={message}");
        Self {
            ok: false,
            message,
            payload: None,
        }
    }
}

/// Opaque handle owning one editing session.
#[flutter_rust_bridge::frb(opaque)]
pub struct DiagramSession {
    inner: EditorSession,
}

impl Default for DiagramSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagramSession {
    /// Starts a session on the built-in starter diagram.
    #[flutter_rust_bridge::frb(sync)]
    pub fn new() -> DiagramSession {
        Self {
            inner: EditorSession::new(),
        }
    }

    /// Starts a session on the starter diagram with view settings given as
    /// JSON (`{"layout": {...}, "graph": {...}}`, every field optional).
    #[flutter_rust_bridge::frb(sync)]
    pub fn with_config(config_json: String) -> Result<DiagramSession, String> {
        let config: EditorConfig = serde_json::from_str(&config_json)
            .map_err(|err| format!("invalid editor config: {err}"))?;
        Ok(Self {
            inner: EditorSession::with_config(Document::default_template(), config),
        })
    }

    /// Current document as `{title, boxes, connections}`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn document(&self) -> SessionResponse {
        to_payload(self.inner.document())
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_title(&mut self, title: String) -> SessionResponse {
        self.inner.set_title(title);
        SessionResponse::success(json!({ "title": self.inner.document().title }))
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn reset(&mut self) -> SessionResponse {
        self.inner.reset_to_template();
        to_payload(self.inner.document())
    }

    /// Lists current invariant violations as `[{code, message}]`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn validate(&self) -> SessionResponse {
        SessionResponse::success(violations_json(&self.inner.validate()))
    }

    /// Appends a box; payload is the new box.
    #[flutter_rust_bridge::frb(sync)]
    pub fn add_box(
        &mut self,
        label: String,
        content: String,
        color: Option<String>,
    ) -> SessionResponse {
        let mut new_box = NewBox::new(label, content);
        new_box.color = color;
        let added = self.inner.add_box(new_box);
        to_payload(&added)
    }

    /// Removes a box and its connections; payload is the removed box.
    #[flutter_rust_bridge::frb(sync)]
    pub fn remove_box(&mut self, id: String) -> SessionResponse {
        match self.inner.remove_box(&id) {
            Ok(removed) => to_payload(&removed),
            Err(err) => SessionResponse::failure(err.to_string()),
        }
    }

    /// Updates the given fields of one box. `None` leaves a field alone; an
    /// empty `color` clears it.
    #[flutter_rust_bridge::frb(sync)]
    pub fn update_box(
        &mut self,
        id: String,
        label: Option<String>,
        content: Option<String>,
        color: Option<String>,
    ) -> SessionResponse {
        let patch = BoxPatch {
            label,
            content,
            color: color.map(|value| Some(value).filter(|value| !value.trim().is_empty())),
            geometry: None,
        };
        match self.inner.update_box(&id, patch) {
            Ok(()) => match self.inner.document().box_by_id(&id) {
                Some(item) => to_payload(item),
                None => SessionResponse::failure(format!("box not found: {id}")),
            },
            Err(err) => SessionResponse::failure(err.to_string()),
        }
    }

    /// Form rows as `[{id, label, content, color}]`.
    #[flutter_rust_bridge::frb(sync)]
    pub fn form_rows(&self) -> SessionResponse {
        to_payload(&self.inner.form_rows())
    }

    /// Applies edited form rows; payload summarizes the import.
    #[flutter_rust_bridge::frb(sync)]
    pub fn apply_form_rows(&mut self, rows_json: String) -> SessionResponse {
        let rows: Vec<FormRow> = match serde_json::from_str(&rows_json) {
            Ok(rows) => rows,
            Err(err) => return SessionResponse::failure(format!("invalid form rows: {err}")),
        };
        let report = self.inner.apply_form_rows(&rows);
        let warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
        SessionResponse::success_with_message(
            warnings.join("\n"),
            json!({
                "updated": report.updated,
                "created": report.created,
                "removed": report.removed,
                "warnings": warnings,
            }),
        )
    }

    /// Connections as `<fromId> -> <toId>` lines.
    #[flutter_rust_bridge::frb(sync)]
    pub fn connections_text(&self) -> SessionResponse {
        SessionResponse::success(Value::String(self.inner.connections_text()))
    }

    /// Replaces connections from edited text. Malformed lines are dropped
    /// and listed; dangling ids are kept and listed.
    #[flutter_rust_bridge::frb(sync)]
    pub fn apply_connections_text(&mut self, text: String) -> SessionResponse {
        let import = self.inner.apply_connections_text(&text);
        let rejected: Vec<Value> = import
            .rejected
            .iter()
            .map(|line| json!({ "line": line.line, "text": line.text }))
            .collect();
        let message = if import.rejected.is_empty() && import.violations.is_empty() {
            String::new()
        } else {
            format!(
                "{} line(s) rejected, {} dangling endpoint(s)",
                import.rejected.len(),
                import.violations.len()
            )
        };
        SessionResponse::success_with_message(
            message,
            json!({
                "applied": import.applied,
                "rejected": rejected,
                "violations": violations_json(&import.violations),
            }),
        )
    }

    /// Canvas shapes; unplaced boxes get default positions first.
    #[flutter_rust_bridge::frb(sync)]
    pub fn canvas_shapes(&mut self) -> SessionResponse {
        to_payload(&self.inner.canvas_shapes())
    }

    /// Applies settled canvas shapes (geometry only).
    #[flutter_rust_bridge::frb(sync)]
    pub fn apply_canvas_shapes(&mut self, shapes_json: String) -> SessionResponse {
        let shapes: Vec<ShapeDescriptor> = match serde_json::from_str(&shapes_json) {
            Ok(shapes) => shapes,
            Err(err) => return SessionResponse::failure(format!("invalid canvas shapes: {err}")),
        };
        let report = self.inner.apply_canvas_shapes(&shapes);
        SessionResponse::success(json!({
            "updated": report.updated,
            "ignored": report.ignored,
        }))
    }

    /// Node/edge rendering request for the layout engine.
    #[flutter_rust_bridge::frb(sync)]
    pub fn render_graph(&self) -> SessionResponse {
        to_payload(&self.inner.render_graph())
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn render_dot(&self) -> SessionResponse {
        SessionResponse::success(Value::String(self.inner.render_dot()))
    }

    /// Encoded diagram file text for download.
    #[flutter_rust_bridge::frb(sync)]
    pub fn save(&self) -> SessionResponse {
        match self.inner.save() {
            Ok(encoded) => SessionResponse::success(Value::String(encoded)),
            Err(err) => SessionResponse::failure(err.to_string()),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn save_to_path(&self, path: String) -> SessionResponse {
        match self.inner.save_to_path(path.trim()) {
            Ok(()) => SessionResponse::success(Value::Null),
            Err(err) => SessionResponse::failure(err.to_string()),
        }
    }

    /// Replaces the document with an uploaded file; payload lists
    /// non-fatal violations of the loaded document.
    #[flutter_rust_bridge::frb(sync)]
    pub fn load(&mut self, input: String) -> SessionResponse {
        match self.inner.load(&input) {
            Ok(violations) => loaded_response(&violations),
            Err(err) => SessionResponse::failure(err.to_string()),
        }
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn load_from_path(&mut self, path: String) -> SessionResponse {
        match self.inner.load_from_path(path.trim()) {
            Ok(violations) => loaded_response(&violations),
            Err(err) => SessionResponse::failure(err.to_string()),
        }
    }
}

fn to_payload<T: Serialize + ?Sized>(value: &T) -> SessionResponse {
    match serde_json::to_value(value) {
        Ok(payload) => SessionResponse::success(payload),
        Err(err) => SessionResponse::failure(format!("payload encoding failed: {err}")),
    }
}

fn violations_json(violations: &[DocumentViolation]) -> Value {
    Value::Array(
        violations
            .iter()
            .map(|violation| {
                json!({
                    "code": violation.code(),
                    "message": violation.to_string(),
                })
            })
            .collect(),
    )
}

fn loaded_response(violations: &[DocumentViolation]) -> SessionResponse {
    let message = if violations.is_empty() {
        String::new()
    } else {
        format!("loaded with {} problem(s)", violations.len())
    };
    SessionResponse::success_with_message(message, violations_json(violations))
}
