use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Anything the layout engine can place: an identifier, the identifiers it
/// depends on, and a box size.
pub trait LayoutItem {
    fn id(&self) -> &str;

    /// Upstream items this one depends on. Every entry must name another item
    /// of the same layout call.
    fn parent_ids(&self) -> &[String];

    /// Upstream items known to exist outside the laid-out set. Only box edges
    /// look at these.
    fn external_parent_ids(&self) -> &[String] {
        &[]
    }

    fn width(&self) -> f32;

    fn height(&self) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Layers run left to right.
    Horizontal,
    /// Layers run top to bottom.
    Vertical,
}

impl Orientation {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "LR" | "horizontal" => Some(Self::Horizontal),
            "TD" | "TB" | "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    /// Anchor point to anchor point.
    Point,
    /// Box center to box center, with stubs for external parents.
    Box,
}

/// Keys a positioned item writes itself, so caller metadata may not use them.
pub const RESERVED_META_KEYS: [&str; 2] = ["x", "y"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawItem")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub external_parent_ids: Vec<String>,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    /// Caller metadata carried through layout untouched, except for
    /// [`RESERVED_META_KEYS`] which are dropped.
    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    id: String,
    #[serde(default)]
    parent_ids: Vec<String>,
    #[serde(default)]
    external_parent_ids: Vec<String>,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(flatten)]
    meta: Map<String, Value>,
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        let mut meta = raw.meta;
        for key in RESERVED_META_KEYS {
            meta.remove(key);
        }
        Self {
            id: raw.id,
            parent_ids: raw.parent_ids,
            external_parent_ids: raw.external_parent_ids,
            width: raw.width,
            height: raw.height,
            meta,
        }
    }
}

impl Item {
    pub fn new<I, S>(id: impl Into<String>, parent_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            parent_ids: parent_ids.into_iter().map(Into::into).collect(),
            external_parent_ids: Vec::new(),
            width: 0.0,
            height: 0.0,
            meta: Map::new(),
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_external_parents<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.external_parent_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Reserved keys are ignored.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !RESERVED_META_KEYS.contains(&key.as_str()) {
            self.meta.insert(key, value.into());
        }
        self
    }

    /// Display name from the `name` metadata field, falling back to the id.
    pub fn label(&self) -> &str {
        self.meta
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(self.id.as_str())
    }
}

impl LayoutItem for Item {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_ids(&self) -> &[String] {
        &self.parent_ids
    }

    fn external_parent_ids(&self) -> &[String] {
        &self.external_parent_ids
    }

    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_json_keeps_extra_fields() {
        let raw = r#"{"id":"3","parentIds":["1"],"width":10,"height":4,"name":"mv","order":3}"#;
        let item: Item = serde_json::from_str(raw).unwrap();
        assert_eq!(item.parent_ids, vec!["1".to_string()]);
        assert!(item.external_parent_ids.is_empty());
        assert_eq!(item.label(), "mv");
        assert_eq!(item.meta.get("order"), Some(&Value::from(3)));

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["name"], "mv");
        assert_eq!(back["parentIds"][0], "1");
    }

    #[test]
    fn position_keys_are_not_metadata() {
        let raw = r#"{"id":"a","x":5,"y":"top","name":"src"}"#;
        let item: Item = serde_json::from_str(raw).unwrap();
        assert!(item.meta.get("x").is_none());
        assert!(item.meta.get("y").is_none());
        assert_eq!(item.label(), "src");

        let item = item.with_meta("x", 1).with_meta("order", 2);
        assert!(item.meta.get("x").is_none());
        assert_eq!(item.meta.get("order"), Some(&Value::from(2)));
    }

    #[test]
    fn orientation_tokens() {
        assert_eq!(Orientation::from_token("LR"), Some(Orientation::Horizontal));
        assert_eq!(Orientation::from_token("TB"), Some(Orientation::Vertical));
        assert_eq!(Orientation::from_token("RL"), None);
    }
}
