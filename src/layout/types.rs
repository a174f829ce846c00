use serde::Serialize;

use crate::ir::LayoutItem;

pub type Point = (f32, f32);

/// Gaps between neighbouring layers and rows, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spacing {
    /// Added after every column.
    pub horizontal: f32,
    /// Added after every row.
    pub vertical: f32,
}

impl Spacing {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self { horizontal, vertical }
    }

    pub fn uniform(gap: f32) -> Self {
        Self::new(gap, gap)
    }

    pub(crate) fn transposed(self) -> Self {
        Self::new(self.vertical, self.horizontal)
    }
}

/// Discrete position of an item before it is mapped to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridCell {
    pub layer: usize,
    pub row: usize,
}

/// A caller item together with its top-left anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Positioned<T> {
    pub x: f32,
    pub y: f32,
    #[serde(flatten)]
    pub item: T,
}

impl<T: LayoutItem> Positioned<T> {
    pub fn anchor(&self) -> Point {
        (self.x, self.y)
    }

    pub fn center(&self) -> Point {
        (
            self.x + self.item.width() / 2.0,
            self.y + self.item.height() / 2.0,
        )
    }

    pub fn left_center(&self) -> Point {
        (self.x, self.y + self.item.height() / 2.0)
    }
}

impl<T: LayoutItem> LayoutItem for Positioned<T> {
    fn id(&self) -> &str {
        self.item.id()
    }

    fn parent_ids(&self) -> &[String] {
        self.item.parent_ids()
    }

    fn external_parent_ids(&self) -> &[String] {
        self.item.external_parent_ids()
    }

    fn width(&self) -> f32 {
        self.item.width()
    }

    fn height(&self) -> f32 {
        self.item.height()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLayout {
    /// The dependent item.
    pub source: String,
    /// The item depended upon, or an external id for stubs.
    pub target: String,
    pub points: Vec<Point>,
    /// Set for stubs whose target is outside the rendered set.
    pub external: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout<T> {
    pub nodes: Vec<Positioned<T>>,
    pub edges: Vec<EdgeLayout>,
    pub width: f32,
    pub height: f32,
}

impl<T> Default for Layout<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            width: 0.0,
            height: 0.0,
        }
    }
}
