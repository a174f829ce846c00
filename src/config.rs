use crate::ir::{EdgeStyle, Orientation};
use crate::layout::DEFAULT_STUB_LENGTH;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry of the fragment graph: operator trees inside fragment boxes, and
/// the boxes themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentLayoutConfig {
    pub operator_node_size: f32,
    pub operator_layer_spacing: f32,
    pub operator_row_spacing: f32,
    pub box_margin_left: f32,
    pub box_margin_right: f32,
    pub box_margin_top: f32,
    pub box_margin_bottom: f32,
    /// Inset of the drawn box border from the space reserved for a fragment.
    pub box_inset: f32,
    pub fragment_spacing: f32,
    pub bottom_padding: f32,
}

impl Default for FragmentLayoutConfig {
    fn default() -> Self {
        Self {
            operator_node_size: 24.0,
            operator_layer_spacing: 48.0,
            operator_row_spacing: 24.0,
            box_margin_left: 72.0,
            box_margin_right: 72.0,
            box_margin_top: 60.0,
            box_margin_bottom: 72.0,
            box_inset: 24.0,
            fragment_spacing: 24.0,
            bottom_padding: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Gap between consecutive layers.
    pub layer_spacing: f32,
    /// Gap between consecutive rows.
    pub row_spacing: f32,
    pub orientation: Orientation,
    /// Offset added to both axes of a vertical layout.
    pub flip_margin: f32,
    pub edge_style: EdgeStyle,
    pub stub_length: f32,
    pub fragment: FragmentLayoutConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            layer_spacing: 50.0,
            row_spacing: 50.0,
            orientation: Orientation::Horizontal,
            flip_margin: 20.0,
            edge_style: EdgeStyle::Box,
            stub_length: DEFAULT_STUB_LENGTH,
            fragment: FragmentLayoutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::dashboard();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    primary_color: Option<String>,
    primary_text_color: Option<String>,
    primary_border_color: Option<String>,
    line_color: Option<String>,
    selected_color: Option<String>,
    operator_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    layer_spacing: Option<f32>,
    row_spacing: Option<f32>,
    orientation: Option<Orientation>,
    flip_margin: Option<f32>,
    edge_style: Option<EdgeStyle>,
    stub_length: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FragmentConfigFile {
    operator_node_size: Option<f32>,
    operator_layer_spacing: Option<f32>,
    operator_row_spacing: Option<f32>,
    box_margin_left: Option<f32>,
    box_margin_right: Option<f32>,
    box_margin_top: Option<f32>,
    box_margin_bottom: Option<f32>,
    box_inset: Option<f32>,
    fragment_spacing: Option<f32>,
    bottom_padding: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    fragment: Option<FragmentConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a config document on top of the defaults. Accepts JSON5, so
/// comments and trailing commas are fine.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match theme_name {
            "modern" => config.theme = Theme::modern(),
            "dashboard" | "default" => config.theme = Theme::dashboard(),
            other => anyhow::bail!("unknown theme {other:?}"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.primary_color {
            config.theme.primary_color = v;
        }
        if let Some(v) = vars.primary_text_color {
            config.theme.primary_text_color = v;
        }
        if let Some(v) = vars.primary_border_color {
            config.theme.primary_border_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.selected_color {
            config.theme.selected_color = v;
        }
        if let Some(v) = vars.operator_color {
            config.theme.operator_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.layer_spacing {
            config.layout.layer_spacing = v;
        }
        if let Some(v) = layout.row_spacing {
            config.layout.row_spacing = v;
        }
        if let Some(v) = layout.orientation {
            config.layout.orientation = v;
        }
        if let Some(v) = layout.flip_margin {
            config.layout.flip_margin = v;
        }
        if let Some(v) = layout.edge_style {
            config.layout.edge_style = v;
        }
        if let Some(v) = layout.stub_length {
            config.layout.stub_length = v;
        }
    }

    if let Some(fragment) = parsed.fragment {
        let target = &mut config.layout.fragment;
        if let Some(v) = fragment.operator_node_size {
            target.operator_node_size = v;
        }
        if let Some(v) = fragment.operator_layer_spacing {
            target.operator_layer_spacing = v;
        }
        if let Some(v) = fragment.operator_row_spacing {
            target.operator_row_spacing = v;
        }
        if let Some(v) = fragment.box_margin_left {
            target.box_margin_left = v;
        }
        if let Some(v) = fragment.box_margin_right {
            target.box_margin_right = v;
        }
        if let Some(v) = fragment.box_margin_top {
            target.box_margin_top = v;
        }
        if let Some(v) = fragment.box_margin_bottom {
            target.box_margin_bottom = v;
        }
        if let Some(v) = fragment.box_inset {
            target.box_inset = v;
        }
        if let Some(v) = fragment.fragment_spacing {
            target.fragment_spacing = v;
        }
        if let Some(v) = fragment.bottom_padding {
            target.bottom_padding = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
