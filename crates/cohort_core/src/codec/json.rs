//! JSON diagram file codec.
//!
//! # Responsibility
//! - Encode a document as the canonical `{title, boxes, edges}` file.
//! - Decode canonical files, the `sections`/`connections` naming variant and
//!   the legacy bare box-list file.
//! - Save/load files without exposing half-written state.
//!
//! # Invariants
//! - `decode(encode(d))` reproduces `d` field for field, order preserved.
//! - Decode either yields a complete document or an error; never a partial one.
//! - Connections are stored as endpoint-id pairs, not display text.

use crate::model::diagram::{Connection, DiagramBox, Document, DocumentViolation, Geometry};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File extension used by save dialogs.
pub const FILE_EXTENSION: &str = "json";

pub type CodecResult<T> = Result<T, CodecError>;

/// Codec failure. The caller's current document is never touched.
#[derive(Debug)]
pub enum CodecError {
    /// Input is not JSON or does not match the file structure.
    Malformed(serde_json::Error),
    /// Box has some but not all of `x, y, w, h`.
    PartialGeometry { id: String },
    /// Box geometry holds NaN or infinity, which JSON cannot carry.
    NonFiniteGeometry { id: String },
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed diagram file: {err}"),
            Self::PartialGeometry { id } => write!(
                f,
                "malformed diagram file: box `{id}` must have all of x, y, w, h or none"
            ),
            Self::NonFiniteGeometry { id } => write!(
                f,
                "cannot encode box `{id}`: geometry must be finite"
            ),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::PartialGeometry { .. } | Self::NonFiniteGeometry { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

/// Decoded document plus the non-fatal violations it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    pub document: Document,
    pub violations: Vec<DocumentViolation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BoxRecord {
    id: String,
    label: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    title: String,
    #[serde(alias = "sections")]
    boxes: Vec<BoxRecord>,
    #[serde(default, alias = "connections")]
    edges: Vec<(String, String)>,
}

/// Top-level shapes accepted by `decode`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileRecord {
    Document(DocumentRecord),
    /// Bare box list written by the table+canvas tool.
    BoxList(Vec<BoxRecord>),
}

impl From<&DiagramBox> for BoxRecord {
    fn from(item: &DiagramBox) -> Self {
        let geometry = item.geometry;
        Self {
            id: item.id.clone(),
            label: item.label.clone(),
            content: item.content.clone(),
            x: geometry.map(|g| g.x),
            y: geometry.map(|g| g.y),
            w: geometry.map(|g| g.width),
            h: geometry.map(|g| g.height),
            color: item.color.clone(),
        }
    }
}

impl TryFrom<BoxRecord> for DiagramBox {
    type Error = CodecError;

    fn try_from(record: BoxRecord) -> Result<Self, Self::Error> {
        let geometry = match (record.x, record.y, record.w, record.h) {
            (Some(x), Some(y), Some(w), Some(h)) => Some(Geometry::new(x, y, w, h)),
            (None, None, None, None) => None,
            _ => return Err(CodecError::PartialGeometry { id: record.id }),
        };
        Ok(Self {
            id: record.id,
            label: record.label,
            content: record.content,
            geometry,
            color: record.color,
        })
    }
}

/// Encodes `document` as pretty-printed canonical JSON.
///
/// # Errors
/// - `CodecError::NonFiniteGeometry` when a box rectangle has a NaN or
///   infinite component; such a file could not be decoded again.
pub fn encode(document: &Document) -> CodecResult<String> {
    if let Some(item) = document
        .boxes
        .iter()
        .find(|item| item.geometry.is_some_and(|geometry| !geometry.is_finite()))
    {
        return Err(CodecError::NonFiniteGeometry {
            id: item.id.clone(),
        });
    }
    let record = DocumentRecord {
        title: document.title.clone(),
        boxes: document.boxes.iter().map(BoxRecord::from).collect(),
        edges: document
            .connections
            .iter()
            .map(|connection| (connection.from.clone(), connection.to.clone()))
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&record)?)
}

/// Decodes a diagram file into a complete document.
///
/// # Errors
/// - `CodecError::Malformed` when JSON is invalid, a box lacks `id`, `label`
///   or `content`, or connections are not two-string lists.
/// - `CodecError::PartialGeometry` when a box has an incomplete rectangle.
pub fn decode(input: &str) -> CodecResult<DecodedDocument> {
    // Untagged errors are opaque; retry the object shape for a precise message.
    let record = match serde_json::from_str::<FileRecord>(input) {
        Ok(FileRecord::Document(record)) => record,
        Ok(FileRecord::BoxList(boxes)) => DocumentRecord {
            title: String::new(),
            boxes,
            edges: Vec::new(),
        },
        Err(untagged_err) => {
            let value: serde_json::Value = serde_json::from_str(input)?;
            if value.is_object() {
                serde_json::from_value::<DocumentRecord>(value)?
            } else {
                return Err(untagged_err.into());
            }
        }
    };

    let boxes = record
        .boxes
        .into_iter()
        .map(DiagramBox::try_from)
        .collect::<CodecResult<Vec<_>>>()?;
    let document = Document {
        title: record.title,
        boxes,
        connections: record
            .edges
            .into_iter()
            .map(|(from, to)| Connection::new(from, to))
            .collect(),
    };
    let violations = document.validate();
    Ok(DecodedDocument {
        document,
        violations,
    })
}

/// Encodes `document` and writes it to `path`.
///
/// Writes a sibling temporary file first and renames it into place, so an
/// interrupted save leaves any previous file intact.
pub fn save_to_path(document: &Document, path: impl AsRef<Path>) -> CodecResult<()> {
    let path = path.as_ref();
    let started_at = Instant::now();
    let encoded = encode(document).map_err(|err| {
        error!(
            "event=diagram_save module=codec status=error error_code=encode_failed error={}",
            err
        );
        err
    })?;
    let staging = staging_path(path);

    let result = std::fs::write(&staging, encoded.as_bytes())
        .and_then(|()| std::fs::rename(&staging, path));
    match result {
        Ok(()) => {
            info!(
                "event=diagram_save module=codec status=ok boxes={} connections={} duration_ms={}",
                document.boxes.len(),
                document.connections.len(),
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            let _ = std::fs::remove_file(&staging);
            error!(
                "event=diagram_save module=codec status=error error_code=io_failed error={}",
                err
            );
            Err(CodecError::Io {
                path: path.to_path_buf(),
                source: err,
            })
        }
    }
}

/// Reads and decodes the diagram file at `path`.
pub fn load_from_path(path: impl AsRef<Path>) -> CodecResult<DecodedDocument> {
    let path = path.as_ref();
    let started_at = Instant::now();
    let input = std::fs::read_to_string(path).map_err(|err| {
        error!(
            "event=diagram_load module=codec status=error error_code=io_failed error={}",
            err
        );
        CodecError::Io {
            path: path.to_path_buf(),
            source: err,
        }
    })?;

    match decode(&input) {
        Ok(decoded) => {
            if decoded.violations.is_empty() {
                info!(
                    "event=diagram_load module=codec status=ok boxes={} duration_ms={}",
                    decoded.document.boxes.len(),
                    started_at.elapsed().as_millis()
                );
            } else {
                warn!(
                    "event=diagram_load module=codec status=warn boxes={} violations={} duration_ms={}",
                    decoded.document.boxes.len(),
                    decoded.violations.len(),
                    started_at.elapsed().as_millis()
                );
            }
            Ok(decoded)
        }
        Err(err) => {
            error!(
                "event=diagram_load module=codec status=error error_code=decode_failed error={}",
                err
            );
            Err(err)
        }
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
