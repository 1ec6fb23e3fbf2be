//! Spatial adapter: canvas rectangles <-> box geometry.
//!
//! # Responsibility
//! - Export boxes as drawable rectangle descriptors for the canvas surface.
//! - Give unplaced boxes a deterministic, non-overlapping default slot.
//! - Copy settled canvas geometry back onto boxes by id.
//!
//! # Invariants
//! - The canvas never creates or deletes boxes; unknown ids are ignored.
//! - Imported geometry is clamped to finite, non-negative values.

use crate::model::diagram::{BoxId, DiagramBox, Document, Geometry};
use crate::service::mutation::{update_box_at, update_box_fields, BoxPatch};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const SHAPE_KIND_RECT: &str = "rect";

/// Canvas placement and styling defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialLayout {
    pub default_width: f64,
    pub default_height: f64,
    /// Left edge and top edge used for placement on an empty canvas.
    pub margin: f64,
    /// Vertical space left between a newly placed box and the one above.
    pub vertical_gap: f64,
    /// Fill for boxes without a color.
    pub fallback_fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

impl Default for SpatialLayout {
    fn default() -> Self {
        Self {
            default_width: 260.0,
            default_height: 80.0,
            margin: 40.0,
            vertical_gap: 60.0,
            fallback_fill: "#eeeeee".to_string(),
            stroke: "#444444".to_string(),
            stroke_width: 2.0,
        }
    }
}

/// Rectangle object exchanged with the canvas surface.
///
/// Field names follow the canvas object model (`left`/`top`, `scaleX`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeDescriptor {
    #[serde(rename = "type", default = "rect_kind")]
    pub kind: String,
    pub id: BoxId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Resize handles scale the object instead of changing `width`.
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    #[serde(default)]
    pub fill: String,
    #[serde(default)]
    pub stroke: String,
    #[serde(default)]
    pub stroke_width: f64,
    /// Box label.
    #[serde(default)]
    pub name: String,
    /// Label and content joined for display.
    #[serde(default)]
    pub text: String,
}

fn rect_kind() -> String {
    SHAPE_KIND_RECT.to_string()
}

fn unit_scale() -> f64 {
    1.0
}

impl ShapeDescriptor {
    /// Effective on-canvas geometry, scale applied and clamped.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(
            self.left,
            self.top,
            self.width * self.scale_x,
            self.height * self.scale_y,
        )
        .clamped()
    }

    fn from_box(item: &DiagramBox, geometry: Geometry, layout: &SpatialLayout) -> Self {
        Self {
            kind: rect_kind(),
            id: item.id.clone(),
            left: geometry.x,
            top: geometry.y,
            width: geometry.width,
            height: geometry.height,
            scale_x: 1.0,
            scale_y: 1.0,
            fill: item
                .color
                .clone()
                .unwrap_or_else(|| layout.fallback_fill.clone()),
            stroke: layout.stroke.clone(),
            stroke_width: layout.stroke_width,
            name: item.label.clone(),
            text: display_text(item),
        }
    }
}

/// Joins label and content for on-canvas presentation.
pub fn display_text(item: &DiagramBox) -> String {
    match (item.label.is_empty(), item.content.is_empty()) {
        (true, _) => item.content.clone(),
        (false, true) => item.label.clone(),
        (false, false) => format!("{}\n{}", item.label, item.content),
    }
}

/// Next default slot: left margin, below the lowest placed box.
pub fn next_default_geometry(document: &Document, layout: &SpatialLayout) -> Geometry {
    let lowest = document
        .boxes
        .iter()
        .filter_map(|item| item.geometry)
        .map(|geometry| geometry.bottom())
        .filter(|bottom| bottom.is_finite())
        .fold(None, |acc: Option<f64>, bottom| {
            Some(acc.map_or(bottom, |current| current.max(bottom)))
        });
    let y = match lowest {
        Some(bottom) => bottom + layout.vertical_gap,
        None => layout.margin,
    };
    Geometry::new(layout.margin, y, layout.default_width, layout.default_height).clamped()
}

/// Assigns default geometry to every unplaced box, in document order.
///
/// Returns the ids that were placed.
pub fn place_unplaced(document: &mut Document, layout: &SpatialLayout) -> Vec<BoxId> {
    let unplaced: Vec<usize> = document
        .boxes
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.is_placed())
        .map(|(index, _)| index)
        .collect();

    let mut placed = Vec::with_capacity(unplaced.len());
    for index in unplaced {
        let geometry = next_default_geometry(document, layout);
        if update_box_at(document, index, BoxPatch::with_geometry(geometry)).is_some() {
            let id = document.boxes[index].id.clone();
            debug!(
                "event=box_place module=spatial status=ok box_id={} x={} y={}",
                id, geometry.x, geometry.y
            );
            placed.push(id);
        }
    }
    placed
}

/// Places unplaced boxes, then exports one descriptor per box.
pub fn export_shapes(document: &mut Document, layout: &SpatialLayout) -> Vec<ShapeDescriptor> {
    place_unplaced(document, layout);
    document
        .boxes
        .iter()
        .filter_map(|item| {
            item.geometry
                .map(|geometry| ShapeDescriptor::from_box(item, geometry, layout))
        })
        .collect()
}

/// Summary of one canvas import.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpatialImportReport {
    pub updated: Vec<BoxId>,
    /// Shape ids with no matching box.
    pub ignored: Vec<BoxId>,
}

/// Overwrites box geometry from settled canvas shapes, matched by id.
pub fn import_shapes(document: &mut Document, shapes: &[ShapeDescriptor]) -> SpatialImportReport {
    let mut report = SpatialImportReport::default();
    for shape in shapes {
        let patch = BoxPatch::with_geometry(shape.geometry());
        match update_box_fields(document, &shape.id, patch) {
            Ok(()) => report.updated.push(shape.id.clone()),
            Err(_) => report.ignored.push(shape.id.clone()),
        }
    }
    if report.ignored.is_empty() {
        debug!(
            "event=canvas_import module=spatial status=ok updated={}",
            report.updated.len()
        );
    } else {
        warn!(
            "event=canvas_import module=spatial status=warn updated={} ignored={}",
            report.updated.len(),
            report.ignored.len()
        );
    }
    report
}
