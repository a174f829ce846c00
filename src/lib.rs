pub mod backpressure;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod fragment;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, load_config};
pub use fragment::{FragmentGraphLayout, TableFragments, layout_fragment_graph};
pub use ir::{EdgeStyle, Item, LayoutItem, Orientation};
pub use layout::{
    EdgeLayout, GridCell, Layout, LayoutError, Positioned, Spacing, compute_grid, compute_layout,
    flip_layout_items, fragment_edges, layout_items, relation_edges,
};
