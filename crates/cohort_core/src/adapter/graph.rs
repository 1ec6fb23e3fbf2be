//! Graph adapter: document -> directed-graph rendering request.
//!
//! # Responsibility
//! - Build the node/edge request consumed by the external layout engine.
//! - Print the request as Graphviz DOT for engines that take text input.
//!
//! # Invariants
//! - One-way projection; nothing here mutates the document.
//! - Connections with a missing endpoint are skipped, never an error.
//! - Duplicate and cyclic edges pass through untouched.

use crate::model::diagram::{BoxId, Connection, DiagramBox, Document};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Rendering options for node text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// Prefix node text with the box label as a heading line.
    pub label_as_heading: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            label_as_heading: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStyle {
    /// Node has a fill color.
    Filled,
    Solid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderNode {
    pub id: BoxId,
    pub text: String,
    pub shape: NodeShape,
    pub fill: Option<String>,
    pub style: FillStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderEdge {
    pub from: BoxId,
    pub to: BoxId,
}

/// Complete request for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderGraph {
    pub title: String,
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    /// Connections left out because an endpoint is missing.
    pub skipped: Vec<Connection>,
}

/// Builds the rendering request for `document`.
pub fn build_render_graph(document: &Document, options: &GraphOptions) -> RenderGraph {
    let nodes = document
        .boxes
        .iter()
        .map(|item| RenderNode {
            id: item.id.clone(),
            text: node_text(item, options),
            shape: NodeShape::Box,
            fill: item.color.clone(),
            style: if item.color.is_some() {
                FillStyle::Filled
            } else {
                FillStyle::Solid
            },
        })
        .collect();

    let (resolved, skipped): (Vec<&Connection>, Vec<&Connection>) = document
        .connections
        .iter()
        .partition(|connection| document.resolves(connection));
    if !skipped.is_empty() {
        debug!(
            "event=graph_build module=graph status=warn skipped={}",
            skipped.len()
        );
    }

    RenderGraph {
        title: document.title.clone(),
        nodes,
        edges: resolved
            .into_iter()
            .map(|connection| RenderEdge {
                from: connection.from.clone(),
                to: connection.to.clone(),
            })
            .collect(),
        skipped: skipped.into_iter().cloned().collect(),
    }
}

fn node_text(item: &DiagramBox, options: &GraphOptions) -> String {
    // Starter contents already open with their label.
    let heading_redundant = item.label.is_empty() || item.content.starts_with(item.label.as_str());
    if !options.label_as_heading || heading_redundant {
        return item.content.clone();
    }
    if item.content.is_empty() {
        return item.label.clone();
    }
    format!("{}\n{}", item.label, item.content)
}

/// Prints the request as a Graphviz DOT digraph.
pub fn to_dot(graph: &RenderGraph) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dot(&mut out, graph);
    out
}

fn write_dot(out: &mut String, graph: &RenderGraph) -> std::fmt::Result {
    writeln!(out, "digraph {{")?;
    if !graph.title.is_empty() {
        writeln!(out, "    label=\"{}\";", escape_dot(&graph.title))?;
        writeln!(out, "    labelloc=t;")?;
    }
    writeln!(out, "    node [shape=box];")?;
    for node in &graph.nodes {
        write!(out, "    \"{}\" [label=\"{}\"", escape_dot(&node.id), escape_dot(&node.text))?;
        if let Some(fill) = &node.fill {
            write!(out, ", style=filled, fillcolor=\"{}\"", escape_dot(fill))?;
        }
        writeln!(out, "];")?;
    }
    for edge in &graph.edges {
        writeln!(
            out,
            "    \"{}\" -> \"{}\";",
            escape_dot(&edge.from),
            escape_dot(&edge.to)
        )?;
    }
    writeln!(out, "}}")
}

fn escape_dot(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{build_render_graph, escape_dot, to_dot, FillStyle, GraphOptions};
    use crate::model::diagram::{Connection, DiagramBox, Document};

    fn document() -> Document {
        let mut document = Document::new("Study");
        let mut a = DiagramBox::with_id("a", "Dataset", "n=10");
        a.color = Some("#e3e6fa".to_string());
        document.boxes.push(a);
        document
            .boxes
            .push(DiagramBox::with_id("b", "Control Group", "Control Group\nn=5"));
        document.connections = vec![
            Connection::new("a", "b"),
            Connection::new("a", "b"),
            Connection::new("b", "a"),
            Connection::new("b", "missing"),
        ];
        document
    }

    #[test]
    fn dangling_edges_are_skipped_not_fatal() {
        let document = document();
        let graph = build_render_graph(&document, &GraphOptions::default());
        assert!(graph.edges.len() < document.connections.len());
        assert_eq!(graph.edges.len(), 3);
        assert_eq!(graph.skipped, vec![Connection::new("b", "missing")]);
    }

    #[test]
    fn heading_is_added_unless_content_repeats_label() {
        let graph = build_render_graph(&document(), &GraphOptions::default());
        assert_eq!(graph.nodes[0].text, "Dataset\nn=10");
        assert_eq!(graph.nodes[1].text, "Control Group\nn=5");
        assert_eq!(graph.nodes[0].style, FillStyle::Filled);
        assert_eq!(graph.nodes[1].style, FillStyle::Solid);

        let plain = build_render_graph(
            &document(),
            &GraphOptions {
                label_as_heading: false,
            },
        );
        assert_eq!(plain.nodes[0].text, "n=10");
    }

    #[test]
    fn dot_output_escapes_and_lists_edges() {
        let graph = build_render_graph(&document(), &GraphOptions::default());
        let dot = to_dot(&graph);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("\"a\" [label=\"Dataset\\nn=10\", style=filled, fillcolor=\"#e3e6fa\"];"));
        assert_eq!(dot.matches("\"a\" -> \"b\";").count(), 2);
        assert!(!dot.contains("missing"));
    }

    #[test]
    fn dot_output_is_complete_for_small_graph() {
        let mut document = Document::new("T");
        document.boxes.push(DiagramBox::with_id("a", "", "x"));
        document.boxes.push(DiagramBox::with_id("b", "", "y"));
        document.connections.push(Connection::new("a", "b"));

        let dot = to_dot(&build_render_graph(&document, &GraphOptions::default()));
        assert_eq!(
            dot,
            "digraph {\n    label=\"T\";\n    labelloc=t;\n    node [shape=box];\n    \
             \"a\" [label=\"x\"];\n    \"b\" [label=\"y\"];\n    \"a\" -> \"b\";\n}\n"
        );
    }

    #[test]
    fn escape_handles_quotes_and_backslashes() {
        assert_eq!(escape_dot("say \"hi\"\\"), "say \\\"hi\\\"\\\\");
    }
}
