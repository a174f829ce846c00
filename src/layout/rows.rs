use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::ops::{Range, RangeInclusive};

use tracing::{debug, trace};

use super::graph::DependencyGraph;
use super::ranking::Layering;

/// Rows reserved in every layer, either by an item or by a connector passing
/// through. Lives only for one row assignment.
#[derive(Debug, Default)]
struct RowOccupancy {
    layers: Vec<BTreeSet<usize>>,
}

impl RowOccupancy {
    fn new(layer_count: usize) -> Self {
        Self {
            layers: vec![BTreeSet::new(); layer_count],
        }
    }

    fn occupy(&mut self, layer: usize, row: usize) {
        self.layers[layer].insert(row);
    }

    fn occupy_line(&mut self, layers: Range<usize>, row: usize) {
        for layer in layers {
            self.occupy(layer, row);
        }
    }

    fn is_occupied(&self, layer: usize, row: usize) -> bool {
        self.layers[layer].contains(&row)
    }

    fn is_line_occupied(&self, layers: RangeInclusive<usize>, row: usize) -> bool {
        layers.into_iter().any(|layer| self.is_occupied(layer, row))
    }

    /// Lowest row that is free in every layer of the span.
    fn first_free_line(&self, layers: RangeInclusive<usize>) -> usize {
        let mut row = 0;
        while self.is_line_occupied(layers.clone(), row) {
            row += 1;
        }
        row
    }
}

struct RowAssigner<'a> {
    layer_of: &'a [usize],
    occupancy: RowOccupancy,
    rows: Vec<Option<usize>>,
}

impl RowAssigner<'_> {
    fn place(&mut self, node: usize, row: usize) {
        self.rows[node] = Some(row);
        self.occupancy.occupy(self.layer_of[node], row);
    }

    /// Places `succ` on `row` and reserves the layers strictly between it and
    /// `node` so later connectors route around this one.
    fn connect(&mut self, node: usize, succ: usize, row: usize) {
        trace!(node, succ, row, "straight connector");
        self.place(succ, row);
        self.occupancy
            .occupy_line(self.layer_of[node] + 1..self.layer_of[succ], row);
    }
}

/// Greedy lane assignment. Layers are walked in increasing order; an item
/// without a row tries to share one with its farthest unplaced successor,
/// then every still unplaced successor is pulled onto the item's row when the
/// straight span is free, or onto the lowest row free along the whole span.
///
/// Output is deterministic for a given input order: successors are tried in
/// descending layer order (ties keep registration order) and rows are probed
/// upward from 0.
pub(crate) fn assign_rows(graph: &DependencyGraph, layering: &Layering) -> Vec<usize> {
    let layer_of = layering.layer_of.as_slice();
    let mut successors = graph.successors.clone();
    for list in &mut successors {
        list.sort_by_key(|&succ| Reverse(layer_of[succ]));
    }

    let mut assigner = RowAssigner {
        layer_of,
        occupancy: RowOccupancy::new(layering.layers.len()),
        rows: vec![None; graph.len()],
    };

    for members in &layering.layers {
        for &node in members {
            let here = layer_of[node];
            let row = match assigner.rows[node] {
                Some(row) => row,
                None => {
                    let partner = successors[node]
                        .iter()
                        .copied()
                        .find(|&succ| assigner.rows[succ].is_none());
                    match partner {
                        Some(succ) => {
                            let row = assigner
                                .occupancy
                                .first_free_line(here..=layer_of[succ]);
                            assigner.place(node, row);
                            assigner.connect(node, succ, row);
                            row
                        }
                        None => {
                            let row = assigner.occupancy.first_free_line(here..=here);
                            assigner.place(node, row);
                            row
                        }
                    }
                }
            };

            for &succ in &successors[node] {
                if assigner.rows[succ].is_some() {
                    continue;
                }
                let span = here + 1..=layer_of[succ];
                let target = if assigner.occupancy.is_line_occupied(span.clone(), row) {
                    assigner.occupancy.first_free_line(span)
                } else {
                    row
                };
                assigner.connect(node, succ, target);
            }
        }
    }

    let rows: Vec<usize> = assigner
        .rows
        .into_iter()
        // Every item belongs to exactly one layer and is visited above.
        .map(Option::unwrap_or_default)
        .collect();
    debug!(
        rows = rows.iter().copied().max().map_or(0, |max| max + 1),
        "assigned rows"
    );
    rows
}
