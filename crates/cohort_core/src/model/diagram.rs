//! Diagram document model.
//!
//! # Responsibility
//! - Define the canonical box/connection/document records shared by the form,
//!   canvas and graph projections.
//! - Report structural problems without rejecting the document.
//!
//! # Invariants
//! - `DiagramBox::id` is stable and never recomputed after creation.
//! - Box ids are unique within one document; duplicates are reported by
//!   `Document::validate()`, never merged.
//! - Connections may reference missing boxes; they are kept as data.
//! - Absent geometry means "unplaced", never the origin.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Stable identifier for one box.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type BoxId = String;

/// Position and size of a box on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns a copy with every negative or non-finite component set to zero.
    pub fn clamped(self) -> Self {
        Self {
            x: non_negative(self.x),
            y: non_negative(self.y),
            width: non_negative(self.width),
            height: non_negative(self.height),
        }
    }

    /// Whether all components are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && [self.x, self.y, self.width, self.height]
                .iter()
                .all(|value| *value >= 0.0)
    }

    /// Whether no component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|value| value.is_finite())
    }

    /// Bottom edge (`y + height`).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the two rectangles share any interior area.
    pub fn overlaps(&self, other: &Geometry) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// One rectangular diagram element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramBox {
    /// Generated once; editing `label` never touches it.
    pub id: BoxId,
    /// Short display name.
    pub label: String,
    /// Multi-line body shown inside the box.
    pub content: String,
    /// `None` until a canvas view places the box.
    pub geometry: Option<Geometry>,
    /// Display styling only, e.g. `#e3e6fa`.
    pub color: Option<String>,
}

impl DiagramBox {
    /// Creates an unplaced, uncolored box with a caller-provided id.
    pub fn with_id(
        id: impl Into<BoxId>,
        label: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            content: content.into(),
            geometry: None,
            color: None,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Directed relationship `from -> to` between two box ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: BoxId,
    pub to: BoxId,
}

impl Connection {
    pub fn new(from: impl Into<BoxId>, to: impl Into<BoxId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn references(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

/// Complete diagram state for one editing session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    /// Display/edit order.
    pub boxes: Vec<DiagramBox>,
    /// Neither unique nor acyclic.
    pub connections: Vec<Connection>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            boxes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn box_index(&self, id: &str) -> Option<usize> {
        self.boxes.iter().position(|item| item.id == id)
    }

    pub fn box_by_id(&self, id: &str) -> Option<&DiagramBox> {
        self.boxes.iter().find(|item| item.id == id)
    }

    pub fn box_by_id_mut(&mut self, id: &str) -> Option<&mut DiagramBox> {
        self.boxes.iter_mut().find(|item| item.id == id)
    }

    pub fn contains_box(&self, id: &str) -> bool {
        self.box_index(id).is_some()
    }

    /// Whether both endpoints of `connection` exist in this document.
    pub fn resolves(&self, connection: &Connection) -> bool {
        self.contains_box(&connection.from) && self.contains_box(&connection.to)
    }

    /// Checks document invariants and returns every violation found.
    ///
    /// Violations are warnings: the document stays usable and nothing is
    /// dropped or merged.
    pub fn validate(&self) -> Vec<DocumentViolation> {
        let mut violations = Vec::new();
        let mut first_seen: HashMap<&str, usize> = HashMap::new();

        for (index, item) in self.boxes.iter().enumerate() {
            if item.id.trim().is_empty() {
                violations.push(DocumentViolation::EmptyBoxId { index });
                continue;
            }
            match first_seen.get(item.id.as_str()) {
                Some(&first_index) => violations.push(DocumentViolation::DuplicateBoxId {
                    id: item.id.clone(),
                    first_index,
                    index,
                }),
                None => {
                    first_seen.insert(item.id.as_str(), index);
                }
            }
            if let Some(geometry) = &item.geometry {
                if !geometry.is_valid() {
                    violations.push(DocumentViolation::InvalidGeometry {
                        id: item.id.clone(),
                    });
                }
            }
        }

        for (connection_index, connection) in self.connections.iter().enumerate() {
            for (endpoint, id) in [
                (Endpoint::From, &connection.from),
                (Endpoint::To, &connection.to),
            ] {
                if !first_seen.contains_key(id.as_str()) {
                    violations.push(DocumentViolation::DanglingEndpoint {
                        connection_index,
                        endpoint,
                        id: id.clone(),
                    });
                }
            }
        }

        violations
    }
}

/// Free-function form of [`Document::validate`].
pub fn validate(document: &Document) -> Vec<DocumentViolation> {
    document.validate()
}

/// Which side of a connection a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    From,
    To,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
        }
    }
}

/// Non-fatal document invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentViolation {
    /// Box at `index` has a blank id.
    EmptyBoxId { index: usize },
    /// Box at `index` reuses the id first seen at `first_index`.
    DuplicateBoxId {
        id: BoxId,
        first_index: usize,
        index: usize,
    },
    /// Connection endpoint does not match any box id.
    DanglingEndpoint {
        connection_index: usize,
        endpoint: Endpoint,
        id: BoxId,
    },
    /// Geometry has a negative or non-finite component.
    InvalidGeometry { id: BoxId },
}

impl DocumentViolation {
    /// Stable machine-readable code for UI/log consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyBoxId { .. } => "empty_box_id",
            Self::DuplicateBoxId { .. } => "duplicate_box_id",
            Self::DanglingEndpoint { .. } => "dangling_endpoint",
            Self::InvalidGeometry { .. } => "invalid_geometry",
        }
    }
}

impl Display for DocumentViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBoxId { index } => write!(f, "box #{index} has an empty id"),
            Self::DuplicateBoxId {
                id,
                first_index,
                index,
            } => write!(
                f,
                "box id `{id}` at #{index} duplicates box #{first_index}"
            ),
            Self::DanglingEndpoint {
                connection_index,
                endpoint,
                id,
            } => write!(
                f,
                "connection #{connection_index} `{}` endpoint references unknown box `{id}`",
                endpoint.as_str()
            ),
            Self::InvalidGeometry { id } => {
                write!(f, "box `{id}` has negative or non-finite geometry")
            }
        }
    }
}
