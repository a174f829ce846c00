//! Streaming job topology and the fragment graph built from it.
//!
//! A table's fragments depend on each other through their actors' upstream
//! actors. Each fragment also carries an operator tree (the stream plan of
//! one of its actors) that is laid out on its own and sized into the
//! fragment's box before the fragments themselves are laid out.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FragmentLayoutConfig, LayoutConfig};
use crate::ir::Item;
use crate::layout::{
    EdgeLayout, LayoutError, Positioned, Spacing, fragment_edges, layout_bounds, layout_items,
};

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z][a-z]+|[A-Z]+|[a-z]+|[0-9]+").unwrap());

const DISPATCHER_PREFIX: &str = "DISPATCHER_TYPE_";
const DISPATCHER_NODE_ID: &str = "dispatcher";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFragments {
    pub table_id: u32,
    #[serde(default)]
    pub fragments: BTreeMap<u32, Fragment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    pub fragment_id: u32,
    #[serde(default)]
    pub actors: Vec<Actor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub actor_id: u32,
    pub fragment_id: u32,
    #[serde(default)]
    pub upstream_actor_id: Vec<u32>,
    #[serde(default)]
    pub dispatcher: Vec<Dispatcher>,
    #[serde(default)]
    pub nodes: Option<StreamNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatcher {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamNode {
    #[serde(default)]
    pub operator_id: u64,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub node_body: Option<NodeBody>,
    #[serde(default)]
    pub input: Vec<StreamNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeBody {
    #[serde(rename = "$case")]
    pub kind: String,
    #[serde(default)]
    pub merge: Option<MergeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeNode {
    pub upstream_fragment_id: u32,
}

impl StreamNode {
    pub fn name(&self) -> &str {
        self.node_body
            .as_ref()
            .map(|body| body.kind.as_str())
            .unwrap_or("unknown")
    }

    /// Merge bodies anywhere in the subtree, in pre-order.
    pub fn merge_nodes(&self) -> Vec<&MergeNode> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(merge) = node.node_body.as_ref().and_then(|body| body.merge.as_ref()) {
                found.push(merge);
            }
            stack.extend(node.input.iter().rev());
        }
        found
    }
}

fn push_unique(list: &mut Vec<String>, seen: &mut HashSet<String>, value: String) {
    if seen.insert(value.clone()) {
        list.push(value);
    }
}

/// One item per fragment. Parents are the fragments owning the actors' upstream
/// actors; upstream actors outside this table turn the actor's merge inputs
/// into external parents.
pub fn fragment_dependency_items(table: &TableFragments) -> Vec<Item> {
    let owner: HashMap<u32, u32> = table
        .fragments
        .values()
        .flat_map(|fragment| fragment.actors.iter())
        .map(|actor| (actor.actor_id, actor.fragment_id))
        .collect();

    let mut items = Vec::with_capacity(table.fragments.len());
    for fragment in table.fragments.values() {
        let mut parents = Vec::new();
        let mut seen_parents = HashSet::new();
        let mut externals = Vec::new();
        let mut seen_externals = HashSet::new();

        for actor in &fragment.actors {
            for upstream in &actor.upstream_actor_id {
                match owner.get(upstream) {
                    Some(fragment_id) => {
                        push_unique(&mut parents, &mut seen_parents, fragment_id.to_string())
                    }
                    None => {
                        let merges = actor
                            .nodes
                            .as_ref()
                            .map(StreamNode::merge_nodes)
                            .unwrap_or_default();
                        for merge in merges {
                            push_unique(
                                &mut externals,
                                &mut seen_externals,
                                merge.upstream_fragment_id.to_string(),
                            );
                        }
                    }
                }
            }
        }

        items.push(
            Item::new(fragment.fragment_id.to_string(), parents)
                .with_external_parents(externals)
                .with_meta("name", format!("Fragment {}", fragment.fragment_id))
                .with_meta("order", fragment.fragment_id),
        );
    }
    debug!(table = table.table_id, fragments = items.len(), "derived fragment dependencies");
    items
}

fn camel_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (idx, word) in WORD_RE.find_iter(raw).enumerate() {
        let lower = word.as_str().to_lowercase();
        if idx == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Short description of how an actor sends its output downstream.
pub fn dispatcher_label(actor: &Actor) -> String {
    let Some(first) = actor.dispatcher.first() else {
        return "noDispatcher".to_string();
    };
    let kind = first
        .kind
        .strip_prefix(DISPATCHER_PREFIX)
        .unwrap_or(&first.kind);
    let name = camel_case(kind);
    if actor.dispatcher.len() == 1 {
        format!("{name}Dispatcher")
    } else if actor.dispatcher.iter().all(|d| d.kind == first.kind) {
        format!("{name}Dispatchers")
    } else {
        "multipleDispatchers".to_string()
    }
}

/// The first actor's operator tree as layout items, ending in a dispatcher
/// node. Inputs are parents, so sources take the first layer.
pub fn operator_tree_items(fragment: &Fragment, config: &FragmentLayoutConfig) -> Vec<Item> {
    let size = config.operator_node_size;
    let Some(actor) = fragment.actors.first() else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let root_parents: Vec<String> = actor.nodes.iter().map(|_| "0".to_string()).collect();
    items.push(
        Item::new(DISPATCHER_NODE_ID, root_parents)
            .with_size(size, size)
            .with_meta("name", dispatcher_label(actor))
            .with_meta("operatorId", DISPATCHER_NODE_ID),
    );

    // Inputs are numbered when their consumer is visited.
    let mut next_id = 1usize;
    let mut stack: Vec<(usize, &StreamNode)> = actor.nodes.iter().map(|node| (0, node)).collect();
    while let Some((id, node)) = stack.pop() {
        let mut parents = Vec::with_capacity(node.input.len());
        let mut children = Vec::with_capacity(node.input.len());
        for input in &node.input {
            parents.push(next_id.to_string());
            children.push((next_id, input));
            next_id += 1;
        }
        stack.extend(children.into_iter().rev());

        let mut item = Item::new(id.to_string(), parents)
            .with_size(size, size)
            .with_meta("name", node.name())
            .with_meta("operatorId", node.operator_id);
        if let Some(identity) = &node.identity {
            item = item.with_meta("identity", identity.as_str());
        }
        items.push(item);
    }
    items
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentBox {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub actor_ids: Vec<String>,
    /// Operator positions relative to the box origin.
    pub operators: Vec<Positioned<Item>>,
    pub operator_edges: Vec<EdgeLayout>,
    pub parent_ids: Vec<String>,
    pub external_parent_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FragmentGraphLayout {
    pub fragments: Vec<FragmentBox>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
}

struct OperatorLayout {
    operators: Vec<Positioned<Item>>,
    edges: Vec<EdgeLayout>,
    width: f32,
    height: f32,
}

fn layout_operators(fragment: &Fragment, config: &FragmentLayoutConfig) -> Result<OperatorLayout, LayoutError> {
    let items = operator_tree_items(fragment, config);
    let mut operators = layout_items(
        &items,
        Spacing::new(config.operator_layer_spacing, config.operator_row_spacing),
    )?;
    let (inner_width, inner_height) = layout_bounds(&operators, &[]);

    for op in &mut operators {
        op.x += config.box_margin_left;
        op.y += config.box_margin_top;
    }
    let edges = fragment_edges(&operators, 0.0)?;

    Ok(OperatorLayout {
        operators,
        edges,
        width: inner_width + config.box_margin_left + config.box_margin_right,
        height: inner_height + config.box_margin_top + config.box_margin_bottom,
    })
}

/// Lays out every fragment's operator tree, sizes the fragment boxes from
/// them, then lays out the boxes and connects them with box edges.
pub fn layout_fragment_graph(
    table: &TableFragments,
    config: &LayoutConfig,
) -> Result<FragmentGraphLayout, LayoutError> {
    let fragment_config = &config.fragment;
    let mut items = fragment_dependency_items(table);
    let mut inner = Vec::with_capacity(items.len());
    for (item, fragment) in items.iter_mut().zip(table.fragments.values()) {
        let operators = layout_operators(fragment, fragment_config)?;
        item.width = operators.width;
        item.height = operators.height;
        inner.push(operators);
    }

    let placed = layout_items(&items, Spacing::uniform(fragment_config.fragment_spacing))?;
    let edges = fragment_edges(&placed, config.stub_length)?;

    let mut width: f32 = 0.0;
    let mut height: f32 = 0.0;
    let mut fragments = Vec::with_capacity(placed.len());
    for ((node, operators), fragment) in placed.into_iter().zip(inner).zip(table.fragments.values()) {
        width = width.max(node.x + node.item.width);
        height = height.max(node.y + node.item.height + fragment_config.bottom_padding);
        fragments.push(FragmentBox {
            name: node.item.label().to_string(),
            id: node.item.id,
            x: node.x,
            y: node.y,
            width: node.item.width,
            height: node.item.height,
            actor_ids: fragment
                .actors
                .iter()
                .map(|actor| actor.actor_id.to_string())
                .collect(),
            operators: operators.operators,
            operator_edges: operators.edges,
            parent_ids: node.item.parent_ids,
            external_parent_ids: node.item.external_parent_ids,
        });
    }

    debug!(fragments = fragments.len(), edges = edges.len(), "laid out fragment graph");
    Ok(FragmentGraphLayout {
        fragments,
        edges,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(operator_id: u64, kind: &str, input: Vec<StreamNode>) -> StreamNode {
        StreamNode {
            operator_id,
            identity: None,
            node_body: Some(NodeBody {
                kind: kind.to_string(),
                merge: None,
            }),
            input,
        }
    }

    fn merge(operator_id: u64, upstream_fragment_id: u32) -> StreamNode {
        StreamNode {
            operator_id,
            identity: Some(format!("Merge {upstream_fragment_id}")),
            node_body: Some(NodeBody {
                kind: "merge".to_string(),
                merge: Some(MergeNode {
                    upstream_fragment_id,
                }),
            }),
            input: Vec::new(),
        }
    }

    fn actor(actor_id: u32, fragment_id: u32, upstream: &[u32], nodes: StreamNode) -> Actor {
        Actor {
            actor_id,
            fragment_id,
            upstream_actor_id: upstream.to_vec(),
            dispatcher: vec![Dispatcher {
                kind: "DISPATCHER_TYPE_HASH".to_string(),
            }],
            nodes: Some(nodes),
        }
    }

    fn table() -> TableFragments {
        let mut fragments = BTreeMap::new();
        fragments.insert(
            1,
            Fragment {
                fragment_id: 1,
                actors: vec![actor(
                    10,
                    1,
                    &[99],
                    node(1, "project", vec![merge(2, 7)]),
                )],
            },
        );
        fragments.insert(
            2,
            Fragment {
                fragment_id: 2,
                actors: vec![
                    actor(20, 2, &[10], node(3, "hashAgg", vec![merge(4, 1)])),
                    actor(21, 2, &[10], node(3, "hashAgg", vec![merge(4, 1)])),
                ],
            },
        );
        fragments.insert(
            3,
            Fragment {
                fragment_id: 3,
                actors: vec![actor(
                    30,
                    3,
                    &[20, 21, 10],
                    node(5, "hashJoin", vec![merge(6, 2), merge(7, 1)]),
                )],
            },
        );
        TableFragments {
            table_id: 1001,
            fragments,
        }
    }

    #[test]
    fn dependencies_follow_upstream_actors() {
        let items = fragment_dependency_items(&table());
        let summary: Vec<(&str, Vec<&str>, Vec<&str>)> = items
            .iter()
            .map(|item| {
                (
                    item.id.as_str(),
                    item.parent_ids.iter().map(String::as_str).collect(),
                    item.external_parent_ids.iter().map(String::as_str).collect(),
                )
            })
            .collect();
        assert_eq!(
            summary,
            vec![
                ("1", vec![], vec!["7"]),
                ("2", vec!["1"], vec![]),
                ("3", vec!["2", "1"], vec![]),
            ]
        );
        assert_eq!(items[0].label(), "Fragment 1");
    }

    #[test]
    fn dispatcher_labels() {
        let mut a = actor(1, 1, &[], node(1, "project", vec![]));
        assert_eq!(dispatcher_label(&a), "hashDispatcher");
        a.dispatcher.push(Dispatcher {
            kind: "DISPATCHER_TYPE_HASH".to_string(),
        });
        assert_eq!(dispatcher_label(&a), "hashDispatchers");
        a.dispatcher.push(Dispatcher {
            kind: "DISPATCHER_TYPE_NO_SHUFFLE".to_string(),
        });
        assert_eq!(dispatcher_label(&a), "multipleDispatchers");
        a.dispatcher.clear();
        assert_eq!(dispatcher_label(&a), "noDispatcher");
        assert_eq!(camel_case("NO_SHUFFLE"), "noShuffle");
    }

    #[test]
    fn operator_tree_ends_in_dispatcher() {
        let table = table();
        let items = operator_tree_items(&table.fragments[&3], &FragmentLayoutConfig::default());
        let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["dispatcher", "0", "1", "2"]);
        assert_eq!(items[0].parent_ids, vec!["0".to_string()]);
        assert_eq!(items[1].parent_ids, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(items[1].label(), "hashJoin");
        assert_eq!(items[2].label(), "merge");
    }

    #[test]
    fn fragment_graph_sizes_boxes_from_operators() {
        let config = LayoutConfig::default();
        let layout = layout_fragment_graph(&table(), &config).unwrap();
        assert_eq!(layout.fragments.len(), 3);
        let fc = &config.fragment;
        for fragment in &layout.fragments {
            assert!(fragment.width >= fc.box_margin_left + fc.box_margin_right + fc.operator_node_size);
            assert!(!fragment.operators.is_empty());
        }
        // 2 -> 1, 3 -> 2, 3 -> 1 and the stub 1 -> 7
        assert_eq!(layout.edges.len(), 4);
        assert_eq!(layout.edges.iter().filter(|edge| edge.external).count(), 1);
        assert_eq!(layout.fragments[2].actor_ids, vec!["30".to_string()]);
        assert!(layout.fragments[0].x < layout.fragments[1].x);
        assert!(layout.fragments[1].x < layout.fragments[2].x);
        assert!(layout.height > 0.0 && layout.width > 0.0);
    }

    #[test]
    fn topology_json_uses_numeric_fragment_keys() {
        let raw = r#"{
            "tableId": 5,
            "fragments": {
                "10": {"fragmentId": 10, "actors": [
                    {"actorId": 1, "fragmentId": 10, "upstreamActorId": [],
                     "dispatcher": [{"type": "DISPATCHER_TYPE_BROADCAST"}],
                     "nodes": {"operatorId": 4, "nodeBody": {"$case": "materialize"}, "input": []}}
                ]},
                "9": {"fragmentId": 9, "actors": []}
            }
        }"#;
        let table: TableFragments = serde_json::from_str(raw).unwrap();
        let ids: Vec<u32> = table.fragments.keys().copied().collect();
        assert_eq!(ids, vec![9, 10]);
        assert_eq!(dispatcher_label(&table.fragments[&10].actors[0]), "broadcastDispatcher");
    }
}
