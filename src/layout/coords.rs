use tracing::debug;

use super::LayoutError;
use super::types::{GridCell, Positioned, Spacing};
use crate::ir::LayoutItem;

fn grow(slot: &mut Option<f32>, extent: f32) {
    *slot = Some(slot.map_or(extent, |current| current.max(extent)));
}

/// `offsets[0] = 0`, `offsets[i] = offsets[i - 1] + extents[i - 1] + gap`.
/// An index whose predecessor has no recorded extent gets no offset.
fn cumulative_offsets(extents: &[Option<f32>], gap: f32) -> Vec<Option<f32>> {
    let mut offsets = Vec::with_capacity(extents.len());
    let mut cursor = Some(0.0f32);
    for extent in extents {
        offsets.push(cursor);
        cursor = match (cursor, extent) {
            (Some(offset), Some(extent)) => Some(offset + extent + gap),
            _ => None,
        };
    }
    offsets
}

/// Columns are as wide as their widest member and rows as tall as their
/// tallest member across all layers.
pub(crate) fn map_to_pixels<T: LayoutItem + Clone>(
    items: &[T],
    cells: &[GridCell],
    spacing: Spacing,
) -> Result<Vec<Positioned<T>>, LayoutError> {
    let layer_count = cells.iter().map(|cell| cell.layer + 1).max().unwrap_or(0);
    let row_count = cells.iter().map(|cell| cell.row + 1).max().unwrap_or(0);

    let mut layer_width: Vec<Option<f32>> = vec![None; layer_count];
    let mut row_height: Vec<Option<f32>> = vec![None; row_count];
    for (item, cell) in items.iter().zip(cells) {
        grow(&mut layer_width[cell.layer], item.width());
        grow(&mut row_height[cell.row], item.height());
    }

    let layer_offset = cumulative_offsets(&layer_width, spacing.horizontal);
    let row_offset = cumulative_offsets(&row_height, spacing.vertical);
    debug!(layers = layer_count, rows = row_count, "mapped grid to pixels");

    items
        .iter()
        .zip(cells)
        .map(|(item, cell)| -> Result<Positioned<T>, LayoutError> {
            let x = layer_offset
                .get(cell.layer)
                .copied()
                .flatten()
                .ok_or(LayoutError::InconsistentLayer { layer: cell.layer })?;
            let y = row_offset
                .get(cell.row)
                .copied()
                .flatten()
                .ok_or(LayoutError::InconsistentRow { row: cell.row })?;
            Ok(Positioned {
                x,
                y,
                item: item.clone(),
            })
        })
        .collect()
}

/// Shifts both axes by `margin`, then swaps them.
pub(crate) fn flip_axes<T>(positioned: Vec<Positioned<T>>, margin: f32) -> Vec<Positioned<T>> {
    positioned
        .into_iter()
        .map(|node| Positioned {
            x: node.y + margin,
            y: node.x + margin,
            item: node.item,
        })
        .collect()
}
