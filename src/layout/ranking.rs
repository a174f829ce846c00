use tracing::debug;

use super::LayoutError;
use super::graph::DependencyGraph;
use crate::ir::LayoutItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Debug, Clone)]
pub(crate) struct Layering {
    /// Longest successor chain below each item.
    pub(crate) depth: Vec<usize>,
    /// `max_depth - depth`: sinks take the highest layers and the deepest
    /// sources take layer 0.
    pub(crate) layer_of: Vec<usize>,
    /// Members of each layer in graph build order.
    pub(crate) layers: Vec<Vec<usize>>,
}

/// Longest-path layering. Depth is computed with a three-state depth-first
/// walk over successors; reaching an item that is still in progress means the
/// dependencies loop back on themselves.
pub(crate) fn compute_layers<T: LayoutItem>(
    graph: &DependencyGraph,
    items: &[T],
) -> Result<Layering, LayoutError> {
    let count = graph.len();
    let mut marks = vec![Mark::Unvisited; count];
    let mut depth = vec![0usize; count];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for &start in &graph.order {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::InProgress;
        stack.push((start, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, cursor) = *frame;
            let successors = &graph.successors[node];
            let Some(&next) = successors.get(cursor) else {
                depth[node] = successors
                    .iter()
                    .map(|&succ| depth[succ] + 1)
                    .max()
                    .unwrap_or(0);
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[next] {
                Mark::Done => {}
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    stack.push((next, 0));
                }
                Mark::InProgress => {
                    let err = LayoutError::CyclicDependency {
                        cycle: cycle_ids(&stack, next, items),
                    };
                    debug!(%err, "rejecting layout input");
                    return Err(err);
                }
            }
        }
    }

    let max_depth = depth.iter().copied().max().unwrap_or(0);
    let layer_of: Vec<usize> = depth.iter().map(|d| max_depth - d).collect();
    let mut layers: Vec<Vec<usize>> = if count == 0 {
        Vec::new()
    } else {
        vec![Vec::new(); max_depth + 1]
    };
    for &node in &graph.order {
        layers[layer_of[node]].push(node);
    }

    debug!(items = count, layers = layers.len(), "assigned layers");
    Ok(Layering {
        depth,
        layer_of,
        layers,
    })
}

/// The in-progress frames from `entry` to the top of the stack form the cycle.
fn cycle_ids<T: LayoutItem>(stack: &[(usize, usize)], entry: usize, items: &[T]) -> Vec<String> {
    let start = stack
        .iter()
        .position(|&(node, _)| node == entry)
        .unwrap_or(0);
    let mut cycle: Vec<String> = stack[start..]
        .iter()
        .map(|&(node, _)| items[node].id().to_string())
        .collect();
    cycle.push(items[entry].id().to_string());
    cycle
}
