use cohort_core::{
    build_render_graph, export_shapes, import_shapes, parse_connections_text, Connection,
    Document, EditorSession, FormRow, GraphOptions, NewBox, SpatialLayout,
};

#[test]
fn graph_skips_dangling_connections_without_failing() {
    let mut document = Document::default_template();
    let first = document.boxes[0].id.clone();
    document
        .connections
        .push(Connection::new(first, "does-not-exist"));

    let graph = build_render_graph(&document, &GraphOptions::default());
    assert!(graph.edges.len() < document.connections.len());
    assert_eq!(graph.edges.len(), 5);
    assert_eq!(graph.nodes.len(), 5);
    assert_eq!(graph.skipped.len(), 1);
}

#[test]
fn connection_text_parsing_rules() {
    let spaced = parse_connections_text("a -> b");
    let compact = parse_connections_text("a->b");
    assert_eq!(spaced.connections, vec![Connection::new("a", "b")]);
    assert_eq!(spaced, compact);

    assert!(parse_connections_text("a b").connections.is_empty());
    assert!(parse_connections_text("a -> b -> c").connections.is_empty());
    assert_eq!(parse_connections_text("a -> b -> c").rejected.len(), 1);
}

#[test]
fn new_box_gets_distinct_default_position() {
    let layout = SpatialLayout::default();
    let mut document = Document::default_template();
    let added = cohort_core::add_box(&mut document, NewBox::new("Excluded", "n=42"));
    assert!(!added.is_placed());

    let first = export_shapes(&mut document.clone(), &layout);
    let second = export_shapes(&mut document, &layout);
    assert_eq!(first, second);

    let shape = second.iter().find(|shape| shape.id == added.id).unwrap();
    assert!(!(shape.left == 0.0 && shape.top == 0.0));
    for other in second.iter().filter(|shape| shape.id != added.id) {
        assert!(!shape.geometry().overlaps(&other.geometry()));
    }
}

#[test]
fn canvas_drag_updates_geometry_only() {
    let mut session = EditorSession::new();
    let mut shapes = session.canvas_shapes();
    shapes[0].left = 333.0;
    shapes[0].top = 444.0;
    shapes[0].name = "ignored".to_string();
    let moved_id = shapes[0].id.clone();

    let report = session.apply_canvas_shapes(&shapes);
    assert_eq!(report.updated.len(), 5);
    assert!(report.ignored.is_empty());
    let moved = session.document().box_by_id(&moved_id).unwrap();
    assert_eq!(moved.geometry.unwrap().x, 333.0);
    assert_eq!(moved.geometry.unwrap().y, 444.0);
    assert_eq!(moved.label, "Dataset");
}

#[test]
fn canvas_json_from_collaborator_is_accepted() {
    let mut document = Document::default_template();
    let id = document.boxes[4].id.clone();
    let json = format!(
        r##"[{{"type": "rect", "id": "{id}", "left": 12, "top": 34, "width": 100,
             "height": 40, "scaleX": 2, "scaleY": 1, "fill": "#fffac8",
             "stroke": "#444", "strokeWidth": 2, "name": "Outcomes", "text": "x"}}]"##
    );
    let shapes: Vec<cohort_core::ShapeDescriptor> = serde_json::from_str(&json).unwrap();
    import_shapes(&mut document, &shapes);
    let geometry = document.boxes[4].geometry.unwrap();
    assert_eq!((geometry.x, geometry.y, geometry.width, geometry.height), (12.0, 34.0, 200.0, 40.0));
}

#[test]
fn form_row_added_on_surface_becomes_box_and_canvas_shape() {
    let mut session = EditorSession::new();
    let mut rows = session.form_rows();
    rows.push(FormRow::new("Excluded", "n=7"));

    let report = session.apply_form_rows(&rows);
    assert_eq!(report.created.len(), 1);
    let shapes = session.canvas_shapes();
    assert_eq!(shapes.len(), 6);
    assert!(shapes.iter().any(|shape| shape.id == report.created[0]));
}

#[test]
fn loaded_file_with_duplicate_ids_syncs_stably() {
    let input = r#"{"boxes": [
        {"id": "a", "label": "A", "content": "one"},
        {"id": "a", "label": "A", "content": "two"}
    ]}"#;
    let mut session = EditorSession::new();
    let violations = session.load(input).unwrap();
    assert_eq!(violations[0].code(), "duplicate_box_id");

    let mut counts = Vec::new();
    for _ in 0..3 {
        let rows = session.form_rows();
        session.apply_form_rows(&rows);
        counts.push(session.document().boxes.len());
    }
    assert_eq!(counts, vec![2, 2, 2]);
    assert_eq!(session.document().boxes[0].content, "one");
    assert_eq!(session.document().boxes[1].content, "two");
}
