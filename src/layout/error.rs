use thiserror::Error;

/// Reasons a layout call is rejected. A failed call never yields partial
/// positions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("item id {0} is declared more than once")]
    DuplicateId(String),

    #[error("item {item} references unknown id {reference}")]
    UnknownReference { item: String, reference: String },

    /// Identifiers along the cycle, in dependency order; the first id is
    /// repeated at the end.
    #[error("graph contains a cycle: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("layer {layer} has no computed offset")]
    InconsistentLayer { layer: usize },

    #[error("row {row} has no computed offset")]
    InconsistentRow { row: usize },
}
