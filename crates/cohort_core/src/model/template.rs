//! Built-in starter diagram.

use crate::model::diagram::{Connection, DiagramBox, Document, Geometry};
use crate::model::identity::fresh_box_id;

pub const DEFAULT_TITLE: &str = "Cohort Diagram";

struct StarterBox {
    label: &'static str,
    content: &'static str,
    geometry: (f64, f64, f64, f64),
    color: &'static str,
}

const STARTER_BOXES: [StarterBox; 5] = [
    StarterBox {
        label: "Dataset",
        content: "TriNetX\nUS Collaborative Network\n(n=117,058,583)",
        geometry: (100.0, 60.0, 260.0, 90.0),
        color: "#e3e6fa",
    },
    StarterBox {
        label: "Criteria",
        content: "Age >45\nExclude AD Comorbidities",
        geometry: (100.0, 200.0, 260.0, 80.0),
        color: "#fbeee6",
    },
    StarterBox {
        label: "Control Group",
        content: "Control Group\nn=1,362,224",
        geometry: (40.0, 340.0, 200.0, 80.0),
        color: "#d6f5e3",
    },
    StarterBox {
        label: "Statin Group",
        content: "Statin Group\nn=1,362,224",
        geometry: (260.0, 340.0, 200.0, 80.0),
        color: "#ffe5e5",
    },
    StarterBox {
        label: "Outcomes",
        content: "No Statin: 44%\nStatin: 13%\nRisk Diff: -31%",
        geometry: (150.0, 500.0, 260.0, 80.0),
        color: "#fffac8",
    },
];

/// Starter edges as `(from, to)` indexes into `STARTER_BOXES`.
const STARTER_EDGES: [(usize, usize); 5] = [(0, 1), (1, 2), (1, 3), (2, 4), (3, 4)];

impl Document {
    /// Builds the built-in starter document with freshly generated ids.
    pub fn default_template() -> Self {
        let mut document = Document::new(DEFAULT_TITLE);
        for starter in &STARTER_BOXES {
            let (x, y, width, height) = starter.geometry;
            let mut item =
                DiagramBox::with_id(fresh_box_id(&document), starter.label, starter.content);
            item.geometry = Some(Geometry::new(x, y, width, height));
            item.color = Some(starter.color.to_string());
            document.boxes.push(item);
        }
        document.connections = STARTER_EDGES
            .iter()
            .map(|&(from, to)| {
                Connection::new(
                    document.boxes[from].id.clone(),
                    document.boxes[to].id.clone(),
                )
            })
            .collect();
        document
    }
}
