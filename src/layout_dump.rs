use crate::fragment::FragmentGraphLayout;
use crate::ir::Item;
use crate::layout::{EdgeLayout, Layout};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

/// A placed item: the item's own fields with `x` and `y` merged in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub parent_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_parent_ids: Vec<String>,
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub external: bool,
    pub points: Vec<[f32; 2]>,
}

impl From<&EdgeLayout> for EdgeDump {
    fn from(edge: &EdgeLayout) -> Self {
        EdgeDump {
            from: edge.source.clone(),
            to: edge.target.clone(),
            external: edge.external,
            points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
        }
    }
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout<Item>) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.item.id.clone(),
                x: node.x,
                y: node.y,
                width: node.item.width,
                height: node.item.height,
                parent_ids: node.item.parent_ids.clone(),
                external_parent_ids: node.item.external_parent_ids.clone(),
                meta: node.item.meta.clone(),
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            nodes,
            edges: layout.edges.iter().map(EdgeDump::from).collect(),
        }
    }
}

pub fn layout_to_json(layout: &Layout<Item>) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_layout(layout))?)
}

pub fn fragment_layout_to_json(layout: &FragmentGraphLayout) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(layout)?)
}

pub fn write_layout_dump(path: &Path, layout: &Layout<Item>) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &LayoutDump::from_layout(layout))?;
    Ok(())
}

pub fn write_fragment_dump(path: &Path, layout: &FragmentGraphLayout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, layout)?;
    Ok(())
}
