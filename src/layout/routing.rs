use std::collections::HashMap;

use tracing::debug;

use super::LayoutError;
use super::types::{EdgeLayout, Positioned};
use crate::ir::LayoutItem;

/// Horizontal length of the stub drawn for a parent outside the rendered set.
pub const DEFAULT_STUB_LENGTH: f32 = 100.0;

fn index_positioned<T: LayoutItem>(nodes: &[Positioned<T>]) -> HashMap<&str, &Positioned<T>> {
    nodes.iter().map(|node| (node.id(), node)).collect()
}

fn resolve_parent<'a, T: LayoutItem>(
    index: &HashMap<&str, &'a Positioned<T>>,
    child: &Positioned<T>,
    parent_id: &str,
) -> Result<&'a Positioned<T>, LayoutError> {
    index
        .get(parent_id)
        .copied()
        .ok_or_else(|| LayoutError::UnknownReference {
            item: child.id().to_string(),
            reference: parent_id.to_string(),
        })
}

/// One two-point edge per declared parent, from the child's anchor to the
/// parent's anchor.
pub fn relation_edges<T: LayoutItem>(nodes: &[Positioned<T>]) -> Result<Vec<EdgeLayout>, LayoutError> {
    let index = index_positioned(nodes);
    let mut edges = Vec::new();
    for node in nodes {
        for parent_id in node.parent_ids() {
            let parent = resolve_parent(&index, node, parent_id)?;
            edges.push(EdgeLayout {
                source: node.id().to_string(),
                target: parent_id.clone(),
                points: vec![node.anchor(), parent.anchor()],
                external: false,
            });
        }
    }
    debug!(edges = edges.len(), "generated relation edges");
    Ok(edges)
}

/// Box-center edges for every declared parent, followed by a horizontal stub
/// of `stub_length` from the child's left-center for every external parent.
/// A negative length draws the stub leftwards.
pub fn fragment_edges<T: LayoutItem>(
    nodes: &[Positioned<T>],
    stub_length: f32,
) -> Result<Vec<EdgeLayout>, LayoutError> {
    let index = index_positioned(nodes);
    let mut edges = Vec::new();
    for node in nodes {
        for parent_id in node.parent_ids() {
            let parent = resolve_parent(&index, node, parent_id)?;
            edges.push(EdgeLayout {
                source: node.id().to_string(),
                target: parent_id.clone(),
                points: vec![node.center(), parent.center()],
                external: false,
            });
        }
        for external_id in node.external_parent_ids() {
            let (x, y) = node.left_center();
            edges.push(EdgeLayout {
                source: node.id().to_string(),
                target: external_id.clone(),
                points: vec![(x, y), (x + stub_length, y)],
                external: true,
            });
        }
    }
    debug!(edges = edges.len(), "generated fragment edges");
    Ok(edges)
}

/// Extent of nodes and edge points measured from the origin.
pub fn layout_bounds<T: LayoutItem>(nodes: &[Positioned<T>], edges: &[EdgeLayout]) -> (f32, f32) {
    let mut max_x: f32 = 0.0;
    let mut max_y: f32 = 0.0;
    for node in nodes {
        max_x = max_x.max(node.x + node.width());
        max_y = max_y.max(node.y + node.height());
    }
    for edge in edges {
        for point in &edge.points {
            max_x = max_x.max(point.0);
            max_y = max_y.max(point.1);
        }
    }
    (max_x, max_y)
}
