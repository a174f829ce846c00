use std::collections::HashMap;

use tracing::debug;

use super::LayoutError;
use crate::ir::LayoutItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Pending,
    Building,
    Built,
}

/// Successor view of the items of one layout call. Nodes are addressed by the
/// index of their item in the input slice.
#[derive(Debug, Clone)]
pub(crate) struct DependencyGraph {
    /// Downstream items of each item, in registration order.
    pub(crate) successors: Vec<Vec<usize>>,
    /// Items in the order they finished building: every item comes after all
    /// of its parents (barring cycles).
    pub(crate) order: Vec<usize>,
}

impl DependencyGraph {
    pub(crate) fn len(&self) -> usize {
        self.successors.len()
    }
}

pub(crate) fn index_items<T: LayoutItem>(items: &[T]) -> Result<HashMap<&str, usize>, LayoutError> {
    let mut index = HashMap::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        if index.insert(item.id(), idx).is_some() {
            return Err(LayoutError::DuplicateId(item.id().to_string()));
        }
    }
    Ok(index)
}

/// Resolves parents before children, registering each item as a successor of
/// every parent it names. Parents are resolved depth-first with an explicit
/// stack so long chains cannot exhaust the call stack.
///
/// A parent that is still being built is a cycle; the edge is recorded anyway
/// and left for the layering pass to reject.
pub(crate) fn build_graph<T: LayoutItem>(items: &[T]) -> Result<DependencyGraph, LayoutError> {
    let index = index_items(items)?;
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut order = Vec::with_capacity(items.len());
    let mut state = vec![BuildState::Pending; items.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..items.len() {
        if state[root] != BuildState::Pending {
            continue;
        }
        state[root] = BuildState::Building;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (idx, cursor) = *frame;
            let Some(parent_id) = items[idx].parent_ids().get(cursor) else {
                state[idx] = BuildState::Built;
                order.push(idx);
                stack.pop();
                continue;
            };
            frame.1 += 1;

            let parent = *index.get(parent_id.as_str()).ok_or_else(|| {
                LayoutError::UnknownReference {
                    item: items[idx].id().to_string(),
                    reference: parent_id.clone(),
                }
            })?;
            successors[parent].push(idx);
            if state[parent] == BuildState::Pending {
                state[parent] = BuildState::Building;
                stack.push((parent, 0));
            }
        }
    }

    debug!(
        items = items.len(),
        edges = successors.iter().map(Vec::len).sum::<usize>(),
        "built dependency graph"
    );
    Ok(DependencyGraph { successors, order })
}
