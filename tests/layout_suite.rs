use std::collections::{HashMap, HashSet};

use stream_graph_layout::{
    EdgeStyle, GridCell, Item, LayoutConfig, LayoutError, Orientation, Spacing, compute_grid,
    compute_layout, flip_layout_items, fragment_edges, layout_items, relation_edges,
};

/// Small deterministic generator so the property checks need no extra crates.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// A random DAG whose items are emitted in shuffled order, with varied sizes
/// and a few external parents.
fn random_dag(seed: u64, count: usize) -> Vec<Item> {
    let mut rng = Lcg(seed);
    let mut items: Vec<Item> = (0..count)
        .map(|i| {
            let mut parents = Vec::new();
            if i > 0 {
                for _ in 0..rng.below(4) {
                    let parent = format!("n{}", rng.below(i as u64));
                    if !parents.contains(&parent) {
                        parents.push(parent);
                    }
                }
            }
            let mut item = Item::new(format!("n{i}"), parents).with_size(
                (5 + rng.below(40)) as f32,
                (5 + rng.below(20)) as f32,
            );
            if rng.below(5) == 0 {
                item = item.with_external_parents([format!("ext{i}")]);
            }
            item
        })
        .collect();
    for i in (1..items.len()).rev() {
        let j = rng.below(i as u64 + 1) as usize;
        items.swap(i, j);
    }
    items
}

/// Longest successor chain per item, computed naively.
fn reference_depths(items: &[Item]) -> HashMap<String, usize> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for item in items {
        for parent in &item.parent_ids {
            children.entry(parent.as_str()).or_default().push(item.id.as_str());
        }
    }
    fn depth<'a>(
        id: &'a str,
        children: &HashMap<&'a str, Vec<&'a str>>,
        memo: &mut HashMap<String, usize>,
    ) -> usize {
        if let Some(&d) = memo.get(id) {
            return d;
        }
        let d = children
            .get(id)
            .map(|kids| {
                kids.iter()
                    .map(|kid| depth(kid, children, memo) + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        memo.insert(id.to_string(), d);
        d
    }
    let mut memo = HashMap::new();
    for item in items {
        depth(&item.id, &children, &mut memo);
    }
    memo
}

fn diamond() -> Vec<Item> {
    vec![
        Item::new("A", Vec::<String>::new()).with_size(1.0, 1.0),
        Item::new("B", ["A"]).with_size(1.0, 1.0),
        Item::new("C", ["A"]).with_size(1.0, 1.0),
        Item::new("D", ["B", "C"]).with_size(1.0, 1.0),
    ]
}

#[test]
fn diamond_scenario() {
    let items = diamond();
    let grid = compute_grid(&items).unwrap();
    let layers: Vec<usize> = grid.iter().map(|cell| cell.layer).collect();
    assert_eq!(layers, vec![0, 1, 1, 2]);
    assert_ne!(grid[1].row, grid[2].row);
    assert!(grid[3].row == grid[1].row || grid[3].row == grid[2].row);

    let placed = layout_items(&items, Spacing::uniform(1.0)).unwrap();
    let edges = relation_edges(&placed).unwrap();
    let pairs: Vec<(&str, &str)> = edges
        .iter()
        .map(|edge| (edge.source.as_str(), edge.target.as_str()))
        .collect();
    assert_eq!(pairs, vec![("B", "A"), ("C", "A"), ("D", "B"), ("D", "C")]);
    for edge in &edges {
        assert_eq!(edge.points.len(), 2);
    }
}

#[test]
fn two_cycle_is_rejected() {
    let items = vec![Item::new("A", ["B"]), Item::new("B", ["A"])];
    match layout_items(&items, Spacing::uniform(1.0)) {
        Err(LayoutError::CyclicDependency { cycle }) => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&"A".to_string()) && cycle.contains(&"B".to_string()));
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn cycle_inside_larger_graph_is_rejected() {
    let mut items = random_dag(7, 30);
    items.push(Item::new("x", ["y", "n0"]));
    items.push(Item::new("y", ["z"]));
    items.push(Item::new("z", ["x"]));
    let config = LayoutConfig {
        orientation: Orientation::Vertical,
        ..LayoutConfig::default()
    };
    assert!(matches!(
        compute_layout(&items, &config),
        Err(LayoutError::CyclicDependency { .. })
    ));
}

#[test]
fn dangling_parent_is_rejected() {
    let items = vec![Item::new("A", Vec::<String>::new()), Item::new("B", ["Z"])];
    assert_eq!(
        layout_items(&items, Spacing::uniform(1.0)).unwrap_err(),
        LayoutError::UnknownReference {
            item: "B".to_string(),
            reference: "Z".to_string(),
        }
    );
}

#[test]
fn duplicate_id_is_rejected() {
    let items = vec![Item::new("A", Vec::<String>::new()), Item::new("A", Vec::<String>::new())];
    assert_eq!(
        compute_grid(&items).unwrap_err(),
        LayoutError::DuplicateId("A".to_string())
    );
}

#[test]
fn layers_follow_the_depth_recurrence() {
    for seed in 1..6 {
        let items = random_dag(seed, 80);
        let grid = compute_grid(&items).unwrap();
        let depths = reference_depths(&items);
        let max_depth = depths.values().copied().max().unwrap_or(0);
        let layer_of: HashMap<&str, usize> = items
            .iter()
            .zip(&grid)
            .map(|(item, cell)| (item.id.as_str(), cell.layer))
            .collect();

        for (item, cell) in items.iter().zip(&grid) {
            assert_eq!(cell.layer, max_depth - depths[&item.id], "seed {seed} item {}", item.id);
            for parent in &item.parent_ids {
                assert!(layer_of[parent.as_str()] < cell.layer, "seed {seed}");
            }
        }
        let used: HashSet<usize> = grid.iter().map(|cell| cell.layer).collect();
        assert_eq!(used.len(), max_depth + 1, "layers are dense");
    }
}

#[test]
fn rows_are_exclusive_within_a_layer() {
    for seed in 10..16 {
        let items = random_dag(seed, 120);
        let grid = compute_grid(&items).unwrap();
        let mut seen: HashSet<GridCell> = HashSet::new();
        for cell in &grid {
            assert!(seen.insert(*cell), "seed {seed}: {cell:?} assigned twice");
        }
    }
}

#[test]
fn coordinates_are_cumulative_extents() {
    let items = random_dag(42, 60);
    let spacing = Spacing::new(7.0, 3.0);
    let grid = compute_grid(&items).unwrap();
    let placed = layout_items(&items, spacing).unwrap();

    let mut layer_width: HashMap<usize, f32> = HashMap::new();
    let mut row_height: HashMap<usize, f32> = HashMap::new();
    for (item, cell) in items.iter().zip(&grid) {
        let w = layer_width.entry(cell.layer).or_insert(0.0);
        *w = w.max(item.width);
        let h = row_height.entry(cell.row).or_insert(0.0);
        *h = h.max(item.height);
    }

    for (node, cell) in placed.iter().zip(&grid) {
        let x: f32 = (0..cell.layer)
            .map(|layer| layer_width[&layer] + spacing.horizontal)
            .sum();
        let y: f32 = (0..cell.row)
            .map(|row| row_height.get(&row).copied().unwrap_or(0.0) + spacing.vertical)
            .sum();
        assert!((node.x - x).abs() < 1e-3, "{}: x {} != {}", node.item.id, node.x, x);
        assert!((node.y - y).abs() < 1e-3, "{}: y {} != {}", node.item.id, node.y, y);
    }
}

#[test]
fn output_keeps_input_order_and_fields() {
    let items = random_dag(3, 40);
    let placed = layout_items(&items, Spacing::uniform(10.0)).unwrap();
    assert_eq!(placed.len(), items.len());
    for (node, item) in placed.iter().zip(&items) {
        assert_eq!(&node.item, item);
    }
}

#[test]
fn identical_input_gives_identical_output() {
    let items = random_dag(99, 150);
    for style in [EdgeStyle::Point, EdgeStyle::Box] {
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let config = LayoutConfig {
                edge_style: style,
                orientation,
                ..LayoutConfig::default()
            };
            let first = compute_layout(&items, &config).unwrap();
            let second = compute_layout(&items, &config).unwrap();
            let coords = |layout: &stream_graph_layout::Layout<Item>| -> Vec<(u32, u32)> {
                layout
                    .nodes
                    .iter()
                    .map(|node| (node.x.to_bits(), node.y.to_bits()))
                    .collect()
            };
            assert_eq!(coords(&first), coords(&second));
            assert_eq!(first.edges, second.edges);
        }
    }
}

#[test]
fn edge_counts_match_declared_dependencies() {
    let items = random_dag(5, 70);
    let placed = layout_items(&items, Spacing::uniform(20.0)).unwrap();
    let parents: usize = items.iter().map(|item| item.parent_ids.len()).sum();
    let externals: usize = items.iter().map(|item| item.external_parent_ids.len()).sum();

    assert_eq!(relation_edges(&placed).unwrap().len(), parents);
    let boxes = fragment_edges(&placed, 100.0).unwrap();
    assert_eq!(boxes.len(), parents + externals);
    assert_eq!(boxes.iter().filter(|edge| edge.external).count(), externals);
}

#[test]
fn external_stub_starts_at_left_center() {
    let items = vec![
        Item::new("1", Vec::<String>::new()).with_size(20.0, 10.0),
        Item::new("2", ["1"])
            .with_size(30.0, 16.0)
            .with_external_parents(["7"]),
    ];
    let placed = layout_items(&items, Spacing::uniform(5.0)).unwrap();
    let edges = fragment_edges(&placed, 100.0).unwrap();

    let node = &placed[1];
    let center = edges.iter().find(|edge| !edge.external).unwrap();
    assert_eq!(center.points[0], (node.x + 15.0, node.y + 8.0));
    assert_eq!(center.points[1], (10.0, 5.0));

    let stub = edges.iter().find(|edge| edge.external).unwrap();
    assert_eq!(stub.source, "2");
    assert_eq!(stub.target, "7");
    assert_eq!(stub.points, vec![(node.x, node.y + 8.0), (node.x + 100.0, node.y + 8.0)]);
}

#[test]
fn flip_swaps_axes_and_adds_margin() {
    let items = random_dag(11, 25);
    let spacing = Spacing::new(4.0, 9.0);
    let plain = layout_items(&items, Spacing::new(spacing.vertical, spacing.horizontal)).unwrap();
    let flipped = flip_layout_items(&items, spacing, 12.0).unwrap();
    for (a, b) in plain.iter().zip(&flipped) {
        assert_eq!(b.x, a.y + 12.0);
        assert_eq!(b.y, a.x + 12.0);
    }
}

#[test]
fn deep_chain_does_not_overflow_the_stack() {
    let count = 20_000;
    let items: Vec<Item> = (0..count)
        .map(|i| {
            let parents: Vec<String> = if i == 0 { Vec::new() } else { vec![(i - 1).to_string()] };
            Item::new(i.to_string(), parents)
        })
        .collect();
    let grid = compute_grid(&items).unwrap();
    assert_eq!(grid[count - 1].layer, count - 1);
    assert!(grid.iter().all(|cell| cell.row == 0));
}

#[test]
fn positioned_json_has_one_x_and_y() {
    let items: Vec<Item> = serde_json::from_str(
        r#"[
            {"id": "a", "parentIds": [], "width": 10, "height": 10, "x": 999, "y": 999},
            {"id": "b", "parentIds": ["a"], "width": 10, "height": 10}
        ]"#,
    )
    .unwrap();
    let placed = layout_items(&items, Spacing::uniform(5.0)).unwrap();
    let json = serde_json::to_string(&placed[1]).unwrap();
    assert_eq!(json.matches("\"x\"").count(), 1);
    assert_eq!(json.matches("\"y\"").count(), 1);

    let first = serde_json::to_value(&placed[0]).unwrap();
    assert_eq!(first["x"], 0.0);
    assert_eq!(first["y"], 0.0);
}
