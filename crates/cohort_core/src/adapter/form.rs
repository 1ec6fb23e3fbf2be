//! Form adapter: tabular rows and connection text <-> document.
//!
//! # Responsibility
//! - Project boxes into editable rows exposing label/content/color only.
//! - Reconcile edited rows back onto boxes, id-first with a positional
//!   fallback for surfaces that do not round-trip ids.
//! - Parse and print the `<fromId> -> <toId>` connection text block.
//!
//! # Invariants
//! - Geometry is never read or written here.
//! - Edits are never dropped silently: mismatches surface as warnings.

use crate::model::diagram::{BoxId, Connection, Document, DocumentViolation};
use crate::service::mutation::{
    add_box, remove_box_at, set_connections, update_box_at, BoxPatch, NewBox,
};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Separator between the two endpoints of one connection line.
pub const CONNECTION_SEPARATOR: &str = "->";

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

/// One editable form row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRow {
    /// Box id, when the editing surface carries it through.
    #[serde(default)]
    pub id: Option<BoxId>,
    pub label: String,
    pub content: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl FormRow {
    /// Creates a row with no prior box correspondence.
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
            content: content.into(),
            color: None,
        }
    }

    fn patch(&self) -> BoxPatch {
        BoxPatch {
            label: Some(self.label.clone()),
            content: Some(self.content.clone()),
            color: Some(self.color.clone()),
            geometry: None,
        }
    }

    fn new_box(&self) -> NewBox {
        NewBox {
            label: self.label.clone(),
            content: self.content.clone(),
            color: self.color.clone(),
            geometry: None,
        }
    }
}

/// Non-fatal problem noticed while importing rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormWarning {
    /// Id-less rows arrived with a different count than the box list.
    RowCountMismatch { rows: usize, boxes: usize },
    /// Row carries an id that is not in the document; imported as a new box.
    UnknownRowId { row: usize, id: BoxId },
    /// Row repeats an id already used by an earlier row; imported as a new box.
    DuplicateRowId { row: usize, id: BoxId },
    /// Color is kept but does not look like `#rgb` or `#rrggbb`.
    InvalidColor { row: usize, value: String },
}

impl Display for FormWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowCountMismatch { rows, boxes } => write!(
                f,
                "form has {rows} row(s) but diagram has {boxes} box(es); matched by position"
            ),
            Self::UnknownRowId { row, id } => {
                write!(f, "row {row} references unknown box `{id}`; created as new box")
            }
            Self::DuplicateRowId { row, id } => {
                write!(f, "row {row} repeats box `{id}`; created as new box")
            }
            Self::InvalidColor { row, value } => {
                write!(f, "row {row} color `{value}` is not a hex color")
            }
        }
    }
}

/// Summary of one row import.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormImportReport {
    pub updated: usize,
    pub created: Vec<BoxId>,
    pub removed: Vec<BoxId>,
    pub warnings: Vec<FormWarning>,
}

/// Exports one row per box, in document order.
pub fn export_rows(document: &Document) -> Vec<FormRow> {
    document
        .boxes
        .iter()
        .map(|item| FormRow {
            id: Some(item.id.clone()),
            label: item.label.clone(),
            content: item.content.clone(),
            color: item.color.clone(),
        })
        .collect()
}

/// Applies edited rows back onto the document.
///
/// If any row carries an id, rows are reconciled by id: matched rows update
/// their box, rows without a match become new boxes, boxes missing from the
/// rows are removed (with their connections) and box order follows row
/// order. A repeated id binds to the next box holding that id, so documents
/// with duplicate ids sync stably. An empty row list means every row was
/// deleted and clears the document. Otherwise, when no row carries an id,
/// rows are applied by position.
pub fn import_rows(document: &mut Document, rows: &[FormRow]) -> FormImportReport {
    let mut report = FormImportReport::default();
    for (row, item) in rows.iter().enumerate() {
        if let Some(value) = item.color.as_deref() {
            let value = value.trim();
            if !value.is_empty() && !HEX_COLOR_RE.is_match(value) {
                report.warnings.push(FormWarning::InvalidColor {
                    row,
                    value: value.to_string(),
                });
            }
        }
    }

    if rows.is_empty() || rows.iter().any(|row| row.id.is_some()) {
        import_by_id(document, rows, &mut report);
    } else {
        import_by_position(document, rows, &mut report);
    }

    if report.warnings.is_empty() {
        debug!(
            "event=form_import module=form status=ok updated={} created={} removed={}",
            report.updated,
            report.created.len(),
            report.removed.len()
        );
    } else {
        warn!(
            "event=form_import module=form status=warn updated={} created={} removed={} warnings={}",
            report.updated,
            report.created.len(),
            report.removed.len(),
            report.warnings.len()
        );
    }
    report
}

fn import_by_id(document: &mut Document, rows: &[FormRow], report: &mut FormImportReport) {
    // Box indices stay stable in this loop: boxes are only appended.
    let mut claimed = vec![false; document.boxes.len()];
    let mut order: Vec<usize> = Vec::with_capacity(rows.len());

    for (row, item) in rows.iter().enumerate() {
        let matched = match item.id.as_deref() {
            Some(id) => {
                let next = document
                    .boxes
                    .iter()
                    .enumerate()
                    .position(|(index, candidate)| {
                        candidate.id == id && !claimed.get(index).copied().unwrap_or(true)
                    });
                if next.is_none() {
                    report.warnings.push(if document.contains_box(id) {
                        FormWarning::DuplicateRowId {
                            row,
                            id: id.to_string(),
                        }
                    } else {
                        FormWarning::UnknownRowId {
                            row,
                            id: id.to_string(),
                        }
                    });
                }
                next
            }
            None => None,
        };

        let index = match matched {
            Some(index) => {
                claimed[index] = true;
                if update_box_at(document, index, item.patch()).is_some() {
                    report.updated += 1;
                }
                index
            }
            None => {
                let created = add_box(document, item.new_box());
                report.created.push(created.id);
                document.boxes.len() - 1
            }
        };
        order.push(index);
    }

    // Rows first in row order, unreferenced boxes after them in document order.
    let mut rank = vec![usize::MAX; document.boxes.len()];
    for (position, &index) in order.iter().enumerate() {
        rank[index] = position;
    }
    let mut ranked: Vec<_> = rank.into_iter().zip(document.boxes.drain(..)).collect();
    ranked.sort_by_key(|(position, _)| *position);
    document.boxes = ranked.into_iter().map(|(_, item)| item).collect();

    let kept = order.len();
    while let Some(removed) = remove_box_at(document, kept) {
        report.removed.push(removed.id);
    }
}

fn import_by_position(document: &mut Document, rows: &[FormRow], report: &mut FormImportReport) {
    if rows.len() != document.boxes.len() {
        report.warnings.push(FormWarning::RowCountMismatch {
            rows: rows.len(),
            boxes: document.boxes.len(),
        });
    }

    let existing = document.boxes.len();
    for (index, item) in rows.iter().enumerate() {
        if index < existing {
            if update_box_at(document, index, item.patch()).is_some() {
                report.updated += 1;
            }
        } else {
            let created = add_box(document, item.new_box());
            report.created.push(created.id);
        }
    }
}

/// Prints connections as one `<fromId> -> <toId>` line each.
pub fn export_connections_text(document: &Document) -> String {
    document
        .connections
        .iter()
        .map(|connection| {
            format!(
                "{} {CONNECTION_SEPARATOR} {}",
                connection.from, connection.to
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Connection text line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based line number in the submitted text.
    pub line: usize,
    pub text: String,
}

/// Parsed connection text block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedConnections {
    pub connections: Vec<Connection>,
    pub rejected: Vec<RejectedLine>,
}

/// Parses connection text.
///
/// Blank lines are skipped. A line is accepted only when it splits into
/// exactly two non-empty endpoints around one separator; anything else is
/// rejected whole, never partially parsed.
pub fn parse_connections_text(text: &str) -> ParsedConnections {
    let mut parsed = ParsedConnections::default();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match parse_connection_line(line) {
            Some(connection) => parsed.connections.push(connection),
            None => parsed.rejected.push(RejectedLine {
                line: index + 1,
                text: line.to_string(),
            }),
        }
    }
    parsed
}

fn parse_connection_line(line: &str) -> Option<Connection> {
    let parts: Vec<&str> = line.split(CONNECTION_SEPARATOR).map(str::trim).collect();
    match parts.as_slice() {
        [from, to] if !from.is_empty() && !to.is_empty() => Some(Connection::new(*from, *to)),
        _ => None,
    }
}

/// Result of replacing connections from edited text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionsImport {
    pub applied: usize,
    pub rejected: Vec<RejectedLine>,
    pub violations: Vec<DocumentViolation>,
}

/// Parses `text` and replaces the document's connections with the result.
pub fn import_connections_text(document: &mut Document, text: &str) -> ConnectionsImport {
    let parsed = parse_connections_text(text);
    if !parsed.rejected.is_empty() {
        warn!(
            "event=connections_parse module=form status=warn rejected={}",
            parsed.rejected.len()
        );
    }
    let applied = parsed.connections.len();
    let violations = set_connections(document, parsed.connections);
    ConnectionsImport {
        applied,
        rejected: parsed.rejected,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        export_connections_text, export_rows, import_connections_text, import_rows,
        parse_connections_text, FormRow, FormWarning, RejectedLine,
    };
    use crate::model::diagram::{Connection, DiagramBox, Document};

    fn document() -> Document {
        let mut document = Document::new("t");
        for id in ["a", "b", "c"] {
            document.boxes.push(DiagramBox::with_id(id, id.to_uppercase(), ""));
        }
        document.connections = vec![Connection::new("a", "b"), Connection::new("b", "c")];
        document
    }

    #[test]
    fn parse_accepts_spaced_and_compact_forms() {
        let parsed = parse_connections_text("a -> b\n  a->b  \n\n");
        assert_eq!(
            parsed.connections,
            vec![Connection::new("a", "b"), Connection::new("a", "b")]
        );
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn parse_rejects_zero_or_many_separators_whole() {
        let parsed = parse_connections_text("a b\na -> b -> c\n -> b\nx -> y");
        assert_eq!(parsed.connections, vec![Connection::new("x", "y")]);
        assert_eq!(
            parsed.rejected,
            vec![
                RejectedLine {
                    line: 1,
                    text: "a b".to_string()
                },
                RejectedLine {
                    line: 2,
                    text: "a -> b -> c".to_string()
                },
                RejectedLine {
                    line: 3,
                    text: "-> b".to_string()
                },
            ]
        );
    }

    #[test]
    fn connection_text_export_parses_back() {
        let document = document();
        let text = export_connections_text(&document);
        assert_eq!(text, "a -> b\nb -> c");
        assert_eq!(parse_connections_text(&text).connections, document.connections);
    }

    #[test]
    fn import_connections_keeps_typos_as_violations() {
        let mut document = document();
        let result = import_connections_text(&mut document, "a -> c\nc -> bb\nnonsense");
        assert_eq!(result.applied, 2);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(document.connections.len(), 2);
    }

    #[test]
    fn export_rows_carries_ids_in_order() {
        let rows = export_rows(&document());
        let ids: Vec<_> = rows.iter().filter_map(|row| row.id.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn id_rows_reorder_create_and_remove() {
        let mut document = document();
        let mut rows = export_rows(&document);
        rows.remove(1);
        rows.swap(0, 1);
        rows[0].content = "edited".to_string();
        rows.push(FormRow::new("New", "fresh"));

        let report = import_rows(&mut document, &rows);
        assert_eq!(report.updated, 2);
        assert_eq!(report.removed, vec!["b".to_string()]);
        assert_eq!(report.created.len(), 1);
        assert!(report.warnings.is_empty());

        let ids: Vec<&str> = document.boxes.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids[..2], ["c", "a"]);
        assert_eq!(ids[2], report.created[0]);
        assert_eq!(document.boxes[0].content, "edited");
        assert!(document.connections.is_empty());
    }

    #[test]
    fn duplicate_and_unknown_row_ids_become_new_boxes() {
        let mut document = document();
        let mut rows = export_rows(&document);
        rows[1].id = Some("a".to_string());
        rows[2].id = Some("zz".to_string());

        let report = import_rows(&mut document, &rows);
        assert_eq!(report.created.len(), 2);
        assert!(report.warnings.contains(&FormWarning::DuplicateRowId {
            row: 1,
            id: "a".to_string()
        }));
        assert!(report.warnings.contains(&FormWarning::UnknownRowId {
            row: 2,
            id: "zz".to_string()
        }));
        assert_eq!(report.removed, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(document.boxes.len(), 3);
        assert!(document.connections.is_empty());
        assert!(document.validate().is_empty());
    }

    #[test]
    fn duplicate_box_ids_sync_without_growing_the_document() {
        let mut document = Document::new("t");
        document.boxes.push(DiagramBox::with_id("a", "A", "one"));
        document.boxes.push(DiagramBox::with_id("a", "A", "two"));

        for _ in 0..3 {
            let rows = export_rows(&document);
            let report = import_rows(&mut document, &rows);
            assert_eq!(report.updated, 2);
            assert!(report.created.is_empty());
            assert!(report.removed.is_empty());
            assert!(report.warnings.is_empty());
        }
        let contents: Vec<&str> = document.boxes.iter().map(|b| b.content.as_str()).collect();
        assert_eq!(contents, ["one", "two"]);

        let mut rows = export_rows(&document);
        rows[1].content = "edited".to_string();
        import_rows(&mut document, &rows);
        assert_eq!(document.boxes.len(), 2);
        assert_eq!(document.boxes[0].content, "one");
        assert_eq!(document.boxes[1].content, "edited");
    }

    #[test]
    fn dropping_one_duplicate_row_removes_only_that_box() {
        let mut document = Document::new("t");
        document.boxes.push(DiagramBox::with_id("a", "A", "one"));
        document.boxes.push(DiagramBox::with_id("a", "A", "two"));
        document.connections = vec![Connection::new("a", "a")];

        let rows = vec![export_rows(&document).remove(0)];
        let report = import_rows(&mut document, &rows);
        assert_eq!(report.removed, vec!["a".to_string()]);
        assert_eq!(document.boxes.len(), 1);
        assert_eq!(document.boxes[0].content, "one");
        assert_eq!(document.connections.len(), 1);
    }

    #[test]
    fn empty_row_list_clears_the_document() {
        let mut document = document();
        let report = import_rows(&mut document, &[]);
        assert_eq!(
            report.removed,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(report.warnings.is_empty());
        assert!(document.boxes.is_empty());
        assert!(document.connections.is_empty());
    }

    #[test]
    fn positional_rows_patch_duplicates_by_position() {
        let mut document = Document::new("t");
        document.boxes.push(DiagramBox::with_id("a", "A", "one"));
        document.boxes.push(DiagramBox::with_id("a", "A", "two"));

        let rows = vec![FormRow::new("A", "one"), FormRow::new("A", "second")];
        let report = import_rows(&mut document, &rows);
        assert_eq!(report.updated, 2);
        assert_eq!(document.boxes[0].content, "one");
        assert_eq!(document.boxes[1].content, "second");
    }

    #[test]
    fn positional_rows_with_fewer_entries_keep_surplus_boxes() {
        let mut document = document();
        let rows = vec![FormRow::new("First", "1")];

        let report = import_rows(&mut document, &rows);
        assert_eq!(report.updated, 1);
        assert_eq!(
            report.warnings,
            vec![FormWarning::RowCountMismatch { rows: 1, boxes: 3 }]
        );
        assert_eq!(document.boxes.len(), 3);
        assert_eq!(document.boxes[0].label, "First");
        assert_eq!(document.boxes[0].id, "a");
    }

    #[test]
    fn positional_rows_with_extra_entries_create_boxes() {
        let mut document = document();
        let mut rows: Vec<FormRow> = export_rows(&document)
            .into_iter()
            .map(|mut row| {
                row.id = None;
                row
            })
            .collect();
        rows.push(FormRow::new("Extra", ""));

        let report = import_rows(&mut document, &rows);
        assert_eq!(report.updated, 3);
        assert_eq!(report.created.len(), 1);
        assert_eq!(document.boxes.len(), 4);
    }

    #[test]
    fn invalid_color_is_kept_and_reported() {
        let mut document = document();
        let mut rows = export_rows(&document);
        rows[0].color = Some("blue".to_string());
        rows[1].color = Some("#A0b".to_string());

        let report = import_rows(&mut document, &rows);
        assert_eq!(
            report.warnings,
            vec![FormWarning::InvalidColor {
                row: 0,
                value: "blue".to_string()
            }]
        );
        assert_eq!(document.boxes[0].color.as_deref(), Some("blue"));
    }
}
