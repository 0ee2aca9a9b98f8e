//! Output renderers for the type graph

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;
use structgraph_core::{Edge, Identity, TypeGraph};

/// Output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Node names then `A -> B;` edges
    #[default]
    Minimal,
    /// Minimal plus node kinds and edge kind/field annotations
    Rich,
    /// `{ "nodes": [...], "edges": [...] }`
    Json,
}

#[derive(Serialize)]
struct GraphDocument<'a> {
    nodes: Vec<&'a Identity>,
    edges: Vec<Edge>,
}

/// Write `graph` to `out` in the requested format
pub fn render<W: Write>(graph: &TypeGraph, format: Format, out: &mut W) -> io::Result<()> {
    match format {
        Format::Minimal => render_text(graph, false, out),
        Format::Rich => render_text(graph, true, out),
        Format::Json => render_json(graph, out),
    }
}

fn render_text<W: Write>(graph: &TypeGraph, rich: bool, out: &mut W) -> io::Result<()> {
    for node in graph.nodes() {
        if rich {
            writeln!(out, "{} ({})", node.name, node.kind)?;
        } else {
            writeln!(out, "{}", node.name)?;
        }
    }
    for edge in graph.edges() {
        if rich {
            writeln!(
                out,
                "{} -> {} [kind={}, field=\"{}\"];",
                edge.from.name, edge.to.name, edge.kind, edge.field_name
            )?;
        } else {
            writeln!(out, "{} -> {};", edge.from.name, edge.to.name)?;
        }
    }
    Ok(())
}

fn render_json<W: Write>(graph: &TypeGraph, out: &mut W) -> io::Result<()> {
    let document = GraphDocument {
        nodes: graph.nodes(),
        edges: graph.edges(),
    };
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)
}
