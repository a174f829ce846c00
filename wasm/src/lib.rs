use serde::Deserialize;
use stream_graph_layout::layout_dump::{fragment_layout_to_json, layout_to_json};
use stream_graph_layout::{
    EdgeStyle, Item, LayoutConfig, Orientation, TableFragments, compute_layout,
    layout_fragment_graph,
};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutOptions {
    layer_spacing: Option<f32>,
    row_spacing: Option<f32>,
    orientation: Option<String>,
    edge_style: Option<EdgeStyle>,
    flip_margin: Option<f32>,
    stub_length: Option<f32>,
}

fn build_layout_config(options: LayoutOptions) -> Result<LayoutConfig, String> {
    let mut config = LayoutConfig::default();
    if let Some(v) = options.layer_spacing {
        config.layer_spacing = v;
    }
    if let Some(v) = options.row_spacing {
        config.row_spacing = v;
    }
    if let Some(token) = options.orientation {
        config.orientation =
            Orientation::from_token(&token).ok_or_else(|| format!("unknown orientation {token:?}"))?;
    }
    if let Some(v) = options.edge_style {
        config.edge_style = v;
    }
    if let Some(v) = options.flip_margin {
        config.flip_margin = v;
    }
    if let Some(v) = options.stub_length {
        config.stub_length = v;
    }
    Ok(config)
}

fn parse_options(options_json: Option<String>) -> Result<LayoutConfig, String> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<LayoutOptions>(&raw).map_err(|e| e.to_string())?,
        None => LayoutOptions::default(),
    };
    build_layout_config(options)
}

fn layout_items_impl(items_json: &str, options_json: Option<String>) -> Result<String, String> {
    let config = parse_options(options_json)?;
    let items: Vec<Item> = serde_json::from_str(items_json).map_err(|e| e.to_string())?;
    let layout = compute_layout(&items, &config).map_err(|e| e.to_string())?;
    layout_to_json(&layout).map_err(|e| e.to_string())
}

fn layout_fragments_impl(table_json: &str, options_json: Option<String>) -> Result<String, String> {
    let config = parse_options(options_json)?;
    let table: TableFragments = serde_json::from_str(table_json).map_err(|e| e.to_string())?;
    let layout = layout_fragment_graph(&table, &config).map_err(|e| e.to_string())?;
    fragment_layout_to_json(&layout).map_err(|e| e.to_string())
}

/// Lays out a JSON array of items and returns the positioned items and edges
/// as JSON.
#[wasm_bindgen]
pub fn layout_items_json(items_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    layout_items_impl(items_json, options_json).map_err(|error| JsValue::from_str(&error))
}

#[wasm_bindgen]
pub fn layout_fragments_json(table_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    layout_fragments_impl(table_json, options_json).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_relation_items_vertically() {
        let items = r#"[
            {"id": "1", "parentIds": [], "name": "source"},
            {"id": "2", "parentIds": ["1"], "name": "mv"}
        ]"#;
        let out = layout_items_impl(
            items,
            Some(r#"{"orientation": "TD", "edgeStyle": "point", "flipMargin": 0}"#.to_string()),
        )
        .expect("two items should lay out");
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["nodes"][1]["name"], "mv");
        assert!(json["nodes"][1]["y"].as_f64().unwrap() > json["nodes"][0]["y"].as_f64().unwrap());
    }

    #[test]
    fn reports_cycles_as_errors() {
        let items = r#"[{"id": "a", "parentIds": ["a"]}]"#;
        let err = layout_items_impl(items, None).unwrap_err();
        assert!(err.contains("cycle"));
    }

    #[test]
    fn rejects_bad_orientation() {
        assert!(parse_options(Some(r#"{"orientation": "up"}"#.to_string())).is_err());
    }
}
