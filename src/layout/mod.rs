mod coords;
mod error;
mod graph;
mod ranking;
mod routing;
mod rows;
pub(crate) mod types;
pub use error::LayoutError;
pub use routing::{DEFAULT_STUB_LENGTH, fragment_edges, layout_bounds, relation_edges};
pub use types::*;

use tracing::instrument;

use crate::config::LayoutConfig;
use crate::ir::{EdgeStyle, LayoutItem, Orientation};

/// Layer and row of every item, in input order.
#[instrument(level = "debug", skip_all, fields(items = items.len()))]
pub fn compute_grid<T: LayoutItem>(items: &[T]) -> Result<Vec<GridCell>, LayoutError> {
    let graph = graph::build_graph(items)?;
    let layering = ranking::compute_layers(&graph, items)?;
    let rows = rows::assign_rows(&graph, &layering);
    Ok(layering
        .layer_of
        .iter()
        .zip(rows)
        .map(|(&layer, row)| GridCell { layer, row })
        .collect())
}

/// Layers advance along x and rows along y. `spacing.horizontal` separates
/// layers, `spacing.vertical` separates rows.
pub fn layout_items<T: LayoutItem + Clone>(
    items: &[T],
    spacing: Spacing,
) -> Result<Vec<Positioned<T>>, LayoutError> {
    let cells = compute_grid(items)?;
    coords::map_to_pixels(items, &cells, spacing)
}

/// Same grid as [`layout_items`] with layers advancing along y instead.
/// `spacing` is given in final screen axes: `horizontal` separates rows and
/// `vertical` separates layers. Both axes are offset by `margin`.
///
/// Column widths still come from item widths and row heights from item
/// heights, measured before the axes are swapped.
pub fn flip_layout_items<T: LayoutItem + Clone>(
    items: &[T],
    spacing: Spacing,
    margin: f32,
) -> Result<Vec<Positioned<T>>, LayoutError> {
    let placed = layout_items(items, spacing.transposed())?;
    Ok(coords::flip_axes(placed, margin))
}

pub fn compute_layout<T: LayoutItem + Clone>(
    items: &[T],
    config: &LayoutConfig,
) -> Result<Layout<T>, LayoutError> {
    if items.is_empty() {
        return Ok(Layout::default());
    }

    let nodes = match config.orientation {
        Orientation::Horizontal => layout_items(
            items,
            Spacing::new(config.layer_spacing, config.row_spacing),
        )?,
        Orientation::Vertical => flip_layout_items(
            items,
            Spacing::new(config.row_spacing, config.layer_spacing),
            config.flip_margin,
        )?,
    };
    let edges = match config.edge_style {
        EdgeStyle::Point => relation_edges(&nodes)?,
        EdgeStyle::Box => fragment_edges(&nodes, config.stub_length)?,
    };
    let (width, height) = layout_bounds(&nodes, &edges);

    Ok(Layout {
        nodes,
        edges,
        width,
        height,
    })
}
