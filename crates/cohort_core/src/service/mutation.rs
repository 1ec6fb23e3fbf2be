//! Identity & mutation engine.
//!
//! # Responsibility
//! - Be the single write path for boxes and connections, whichever view
//!   requested the change.
//! - Express every change as a discrete `EditOp` whose `EditOutcome` carries
//!   the prior state needed to invert it.
//!
//! # Invariants
//! - `update_box_fields` never changes a box id.
//! - `add_box` always assigns an id unused in the document.
//! - `remove_box` leaves no connection referencing the removed id.
//! - Invalid connection endpoints are kept and reported, never dropped.
//! - Geometry is stored clamped: finite and non-negative.

use crate::model::diagram::{
    BoxId, Connection, DiagramBox, Document, DocumentViolation, Geometry,
};
use crate::model::identity::fresh_box_id;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MutationResult<T> = Result<T, MutationError>;

/// Explicit signal for edits that target a missing box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    BoxNotFound(BoxId),
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BoxNotFound(id) => write!(f, "box not found: {id}"),
        }
    }
}

impl Error for MutationError {}

/// Initial field values for a box created through the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewBox {
    pub label: String,
    pub content: String,
    pub color: Option<String>,
    pub geometry: Option<Geometry>,
}

impl NewBox {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Partial update for one box. `None` leaves the field untouched.
///
/// `color` and `geometry` are doubly optional: `Some(None)` clears the field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoxPatch {
    pub label: Option<String>,
    pub content: Option<String>,
    pub color: Option<Option<String>>,
    pub geometry: Option<Option<Geometry>>,
}

impl BoxPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.content.is_none()
            && self.color.is_none()
            && self.geometry.is_none()
    }

    pub fn with_geometry(geometry: Geometry) -> Self {
        Self {
            geometry: Some(Some(geometry)),
            ..Self::default()
        }
    }

    /// Applies this patch and returns the patch that restores prior values.
    fn apply_to(self, target: &mut DiagramBox) -> BoxPatch {
        let mut previous = BoxPatch::default();
        if let Some(label) = self.label {
            previous.label = Some(std::mem::replace(&mut target.label, label));
        }
        if let Some(content) = self.content {
            previous.content = Some(std::mem::replace(&mut target.content, content));
        }
        if let Some(color) = self.color {
            let color = normalize_color(color);
            previous.color = Some(std::mem::replace(&mut target.color, color));
        }
        if let Some(geometry) = self.geometry {
            let geometry = geometry.map(Geometry::clamped);
            previous.geometry = Some(std::mem::replace(&mut target.geometry, geometry));
        }
        previous
    }
}

/// One discrete document edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    AddBox(NewBox),
    RemoveBox(BoxId),
    UpdateBox { id: BoxId, patch: BoxPatch },
    SetConnections(Vec<Connection>),
}

/// Result of one applied edit, including what was replaced.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    BoxAdded(DiagramBox),
    BoxRemoved {
        index: usize,
        removed: DiagramBox,
        /// Cascaded connections with their former list positions.
        connections: Vec<(usize, Connection)>,
    },
    BoxUpdated {
        id: BoxId,
        previous: BoxPatch,
    },
    ConnectionsReplaced {
        previous: Vec<Connection>,
        violations: Vec<DocumentViolation>,
    },
}

/// Applies one edit to `document`.
///
/// # Errors
/// - `MutationError::BoxNotFound` for remove/update of a missing id; the
///   document is left unchanged.
pub fn apply(document: &mut Document, op: EditOp) -> MutationResult<EditOutcome> {
    match op {
        EditOp::AddBox(new_box) => Ok(EditOutcome::BoxAdded(insert_box(document, new_box))),
        EditOp::RemoveBox(id) => {
            let (index, removed, connections) = take_box(document, id)?;
            Ok(EditOutcome::BoxRemoved {
                index,
                removed,
                connections,
            })
        }
        EditOp::UpdateBox { id, patch } => {
            let previous = patch_box(document, &id, patch)?;
            Ok(EditOutcome::BoxUpdated { id, previous })
        }
        EditOp::SetConnections(connections) => {
            let (previous, violations) = replace_connections(document, connections);
            Ok(EditOutcome::ConnectionsReplaced {
                previous,
                violations,
            })
        }
    }
}

/// Appends a new box with a fresh id and returns it.
pub fn add_box(document: &mut Document, new_box: NewBox) -> DiagramBox {
    insert_box(document, new_box)
}

/// Removes the box and every connection referencing it.
///
/// Returns the removed box.
pub fn remove_box(document: &mut Document, id: &str) -> MutationResult<DiagramBox> {
    take_box(document, id.to_string()).map(|(_, removed, _)| removed)
}

/// Applies a partial update to exactly the box matching `id`.
pub fn update_box_fields(
    document: &mut Document,
    id: &str,
    patch: BoxPatch,
) -> MutationResult<()> {
    patch_box(document, id, patch).map(|_| ())
}

/// Replaces the connection list wholesale.
///
/// Returns dangling-endpoint violations found after the replace; the
/// offending connections stay in the document so the user can fix them.
pub fn set_connections(
    document: &mut Document,
    connections: Vec<Connection>,
) -> Vec<DocumentViolation> {
    replace_connections(document, connections).1
}

fn insert_box(document: &mut Document, new_box: NewBox) -> DiagramBox {
    let item = DiagramBox {
        id: fresh_box_id(document),
        label: new_box.label,
        content: new_box.content,
        geometry: new_box.geometry.map(Geometry::clamped),
        color: normalize_color(new_box.color),
    };
    debug!(
        "event=box_add module=mutation status=ok box_id={} placed={}",
        item.id,
        item.is_placed()
    );
    document.boxes.push(item.clone());
    item
}

type RemovedBox = (usize, DiagramBox, Vec<(usize, Connection)>);

fn take_box(document: &mut Document, id: BoxId) -> MutationResult<RemovedBox> {
    let Some(index) = document.box_index(&id) else {
        warn!("event=box_remove module=mutation status=not_found box_id={id}");
        return Err(MutationError::BoxNotFound(id));
    };
    Ok(take_box_at(document, index))
}

/// Removes the box at `index`, which must be in bounds.
fn take_box_at(document: &mut Document, index: usize) -> RemovedBox {
    let removed = document.boxes.remove(index);
    let id = removed.id.clone();

    // A duplicate-id sibling keeps its connections alive.
    let mut cascaded = Vec::new();
    if !document.contains_box(&id) {
        let mut kept = Vec::with_capacity(document.connections.len());
        for (position, connection) in document.connections.drain(..).enumerate() {
            if connection.references(&id) {
                cascaded.push((position, connection));
            } else {
                kept.push(connection);
            }
        }
        document.connections = kept;
    }
    debug!(
        "event=box_remove module=mutation status=ok box_id={} cascaded={}",
        id,
        cascaded.len()
    );
    (index, removed, cascaded)
}

fn patch_box(document: &mut Document, id: &str, patch: BoxPatch) -> MutationResult<BoxPatch> {
    let Some(target) = document.box_by_id_mut(id) else {
        warn!("event=box_update module=mutation status=not_found box_id={id}");
        return Err(MutationError::BoxNotFound(id.to_string()));
    };
    let previous = patch.apply_to(target);
    debug!("event=box_update module=mutation status=ok box_id={id}");
    Ok(previous)
}

/// Removes the box at `index` with the same cascade as `remove_box`.
///
/// Addresses one box among duplicates of the same id.
pub(crate) fn remove_box_at(document: &mut Document, index: usize) -> Option<DiagramBox> {
    if index >= document.boxes.len() {
        return None;
    }
    Some(take_box_at(document, index).1)
}

/// Patches the box at `index`; `None` when out of bounds.
pub(crate) fn update_box_at(
    document: &mut Document,
    index: usize,
    patch: BoxPatch,
) -> Option<BoxPatch> {
    let target = document.boxes.get_mut(index)?;
    let previous = patch.apply_to(target);
    debug!(
        "event=box_update module=mutation status=ok box_id={} index={}",
        target.id, index
    );
    Some(previous)
}

fn replace_connections(
    document: &mut Document,
    connections: Vec<Connection>,
) -> (Vec<Connection>, Vec<DocumentViolation>) {
    let previous = std::mem::replace(&mut document.connections, connections);
    let violations: Vec<DocumentViolation> = document
        .validate()
        .into_iter()
        .filter(|violation| {
            matches!(violation, DocumentViolation::DanglingEndpoint { .. })
        })
        .collect();
    if violations.is_empty() {
        debug!(
            "event=connections_set module=mutation status=ok count={}",
            document.connections.len()
        );
    } else {
        warn!(
            "event=connections_set module=mutation status=warn count={} dangling={}",
            document.connections.len(),
            violations.len()
        );
    }
    (previous, violations)
}

/// Trims a color value and maps blank input to `None`.
pub(crate) fn normalize_color(color: Option<String>) -> Option<String> {
    color
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        add_box, apply, normalize_color, remove_box, remove_box_at, set_connections,
        update_box_at, update_box_fields, BoxPatch, EditOp, EditOutcome, MutationError, NewBox,
    };
    use crate::model::diagram::{Connection, DiagramBox, Document, Geometry};

    fn document() -> Document {
        let mut document = Document::new("t");
        for id in ["a", "b", "c"] {
            document.boxes.push(DiagramBox::with_id(id, id.to_uppercase(), ""));
        }
        document.connections = vec![
            Connection::new("a", "b"),
            Connection::new("b", "c"),
            Connection::new("c", "a"),
        ];
        document
    }

    #[test]
    fn add_box_appends_with_normalized_color() {
        let mut document = document();
        let mut new_box = NewBox::new("New", "body");
        new_box.color = Some("   ".to_string());

        let added = add_box(&mut document, new_box);
        assert_eq!(document.boxes.len(), 4);
        assert_eq!(document.boxes[3], added);
        assert_eq!(added.color, None);
        assert!(!added.is_placed());
    }

    #[test]
    fn remove_box_reports_cascaded_connections_with_positions() {
        let mut document = document();
        let outcome = apply(&mut document, EditOp::RemoveBox("b".to_string())).unwrap();

        let EditOutcome::BoxRemoved {
            index, connections, ..
        } = outcome
        else {
            panic!("expected BoxRemoved");
        };
        assert_eq!(index, 1);
        assert_eq!(
            connections,
            vec![(0, Connection::new("a", "b")), (1, Connection::new("b", "c"))]
        );
        assert_eq!(document.connections, vec![Connection::new("c", "a")]);
    }

    #[test]
    fn remove_missing_box_is_explicit_and_harmless() {
        let mut document = document();
        let before = document.clone();
        let err = remove_box(&mut document, "zzz").unwrap_err();
        assert_eq!(err, MutationError::BoxNotFound("zzz".to_string()));
        assert_eq!(document, before);
    }

    #[test]
    fn remove_duplicate_id_keeps_connections_of_survivor() {
        let mut document = document();
        document.boxes.push(DiagramBox::with_id("a", "A twin", ""));
        remove_box(&mut document, "a").unwrap();
        assert!(document.contains_box("a"));
        assert_eq!(document.connections.len(), 3);
    }

    #[test]
    fn update_returns_inverse_patch() {
        let mut document = document();
        let patch = BoxPatch {
            content: Some("n=10".to_string()),
            color: Some(Some("#fff".to_string())),
            ..BoxPatch::default()
        };
        let outcome = apply(
            &mut document,
            EditOp::UpdateBox {
                id: "c".to_string(),
                patch,
            },
        )
        .unwrap();

        assert_eq!(
            outcome,
            EditOutcome::BoxUpdated {
                id: "c".to_string(),
                previous: BoxPatch {
                    content: Some(String::new()),
                    color: Some(None),
                    ..BoxPatch::default()
                },
            }
        );
        assert_eq!(document.boxes[2].content, "n=10");
        assert_eq!(document.boxes[2].id, "c");
    }

    #[test]
    fn update_geometry_can_be_set_and_cleared() {
        let mut document = document();
        let geometry = Geometry::new(1.0, 2.0, 3.0, 4.0);
        update_box_fields(&mut document, "a", BoxPatch::with_geometry(geometry)).unwrap();
        assert_eq!(document.boxes[0].geometry, Some(geometry));

        let clear = BoxPatch {
            geometry: Some(None),
            ..BoxPatch::default()
        };
        update_box_fields(&mut document, "a", clear).unwrap();
        assert_eq!(document.boxes[0].geometry, None);
    }

    #[test]
    fn stored_geometry_is_clamped_on_every_write() {
        let mut document = document();
        let bad = Geometry::new(f64::NAN, -5.0, f64::INFINITY, 4.0);
        update_box_fields(&mut document, "a", BoxPatch::with_geometry(bad)).unwrap();
        assert_eq!(
            document.boxes[0].geometry,
            Some(Geometry::new(0.0, 0.0, 0.0, 4.0))
        );

        let mut new_box = NewBox::new("N", "");
        new_box.geometry = Some(bad);
        let added = add_box(&mut document, new_box);
        assert!(added.geometry.unwrap().is_valid());
        assert!(document.validate().is_empty());
    }

    #[test]
    fn index_helpers_address_one_of_duplicate_ids() {
        let mut document = document();
        document.boxes.push(DiagramBox::with_id("a", "A twin", ""));

        let patch = BoxPatch {
            content: Some("twin".to_string()),
            ..BoxPatch::default()
        };
        assert!(update_box_at(&mut document, 3, patch).is_some());
        assert_eq!(document.boxes[0].content, "");
        assert_eq!(document.boxes[3].content, "twin");

        let removed = remove_box_at(&mut document, 3).unwrap();
        assert_eq!(removed.label, "A twin");
        assert_eq!(document.connections.len(), 3);
        assert!(remove_box_at(&mut document, 9).is_none());
        assert!(update_box_at(&mut document, 9, BoxPatch::default()).is_none());
    }

    #[test]
    fn set_connections_keeps_dangling_entries_and_reports_them() {
        let mut document = document();
        let violations = set_connections(
            &mut document,
            vec![Connection::new("a", "typo"), Connection::new("a", "c")],
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(document.connections.len(), 2);
    }

    #[test]
    fn normalize_color_trims() {
        assert_eq!(
            normalize_color(Some(" #abc ".to_string())).as_deref(),
            Some("#abc")
        );
        assert_eq!(normalize_color(Some(String::new())), None);
    }
}
