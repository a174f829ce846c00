use crate::backpressure::{BackPressureMap, edge_color, edge_width};
use crate::config::{FragmentLayoutConfig, RenderConfig};
use crate::fragment::{FragmentBox, FragmentGraphLayout};
use crate::ir::{EdgeStyle, Item};
use crate::layout::{Layout, Point};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const DOT_RADIUS: f32 = 5.0;
const OPERATOR_RADIUS: f32 = 12.0;
const PADDING: f32 = 20.0;

/// Draws a plain item layout: boxes joined center to center, or dots joined
/// anchor to anchor for point-style layouts.
pub fn render_svg(layout: &Layout<Item>, style: EdgeStyle, theme: &Theme) -> String {
    let width = layout.width + PADDING * 2.0;
    let height = layout.height + PADDING * 2.0;
    let mut svg = svg_header(width, height, theme);
    svg.push_str(&format!("<g transform=\"translate({PADDING}, {PADDING})\">"));

    svg.push_str("<g class=\"edges\">");
    for edge in &layout.edges {
        let dash = if edge.external { " stroke-dasharray=\"4 3\"" } else { "" };
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\"{dash}/>",
            points_to_path(&edge.points),
            theme.line_color,
        ));
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for node in &layout.nodes {
        let label = escape_xml(node.item.label());
        match style {
            EdgeStyle::Point => {
                svg.push_str(&format!(
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{DOT_RADIUS}\" fill=\"{}\"/>",
                    node.x, node.y, theme.primary_border_color
                ));
                svg.push_str(&format!(
                    "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" dominant-baseline=\"middle\">{label}</text>",
                    node.x + DOT_RADIUS * 2.0,
                    node.y,
                    theme.font_family,
                    theme.font_size,
                    theme.primary_text_color,
                ));
            }
            EdgeStyle::Box => {
                svg.push_str(&format!(
                    "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"5\" ry=\"5\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
                    node.x,
                    node.y,
                    node.item.width,
                    node.item.height,
                    theme.primary_color,
                    theme.primary_border_color,
                ));
                svg.push_str(&format!(
                    "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{label}</text>",
                    node.x + node.item.width / 2.0,
                    node.y + node.item.height / 2.0,
                    theme.font_family,
                    theme.font_size,
                    theme.primary_text_color,
                ));
            }
        }
    }
    svg.push_str("</g></g></svg>");
    svg
}

/// Draws fragment boxes with their operator trees, and the fragment edges
/// styled by back-pressure when it is known.
pub fn render_fragment_svg(
    layout: &FragmentGraphLayout,
    config: &FragmentLayoutConfig,
    theme: &Theme,
    back_pressure: Option<&BackPressureMap>,
    selected: Option<&str>,
) -> String {
    let mut svg = svg_header(layout.width, layout.height, theme);

    svg.push_str("<g class=\"fragment-edges\">");
    for edge in &layout.edges {
        let is_selected = selected
            .map(|id| id == edge.source || id == edge.target)
            .unwrap_or(false);
        let pressure = back_pressure.and_then(|map| map.for_edge(&edge.source, &edge.target));
        let (stroke, stroke_width) = match pressure {
            Some(percent) => (edge_color(percent), edge_width(percent)),
            None if is_selected => (theme.selected_color.clone(), 4.0),
            None => (theme.line_color.clone(), 2.0),
        };
        svg.push_str(&format!(
            "<g class=\"fragment-edge\"><path d=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"{stroke_width:.2}\"/>",
            points_to_path(&edge.points),
        ));
        if let Some(percent) = pressure {
            svg.push_str(&format!("<title>{percent:.2}%</title>"));
        }
        svg.push_str("</g>");
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"fragments\">");
    for fragment in &layout.fragments {
        let is_selected = selected == Some(fragment.id.as_str());
        svg.push_str(&fragment_svg(fragment, config, theme, is_selected));
    }
    svg.push_str("</g></svg>");
    svg
}

fn fragment_svg(fragment: &FragmentBox, config: &FragmentLayoutConfig, theme: &Theme, selected: bool) -> String {
    let inset = config.box_inset;
    let mut out = format!(
        "<g class=\"fragment\" transform=\"translate({:.2}, {:.2})\">",
        fragment.x, fragment.y
    );
    let (border, border_width) = if selected {
        (theme.selected_color.as_str(), 3)
    } else {
        (theme.primary_border_color.as_str(), 1)
    };
    out.push_str(&format!(
        "<rect class=\"bounding-box\" x=\"{inset}\" y=\"{inset}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"5\" fill=\"{}\" stroke=\"{border}\" stroke-width=\"{border_width}\"/>",
        (fragment.width - inset * 2.0).max(0.0),
        (fragment.height - inset * 2.0).max(0.0),
        theme.primary_color,
    ));

    let caption_x = fragment.width - inset;
    let caption_y = fragment.height - inset;
    out.push_str(&caption(caption_x, caption_y + 12.0, &fragment.name, theme));
    out.push_str(&caption(
        caption_x,
        caption_y + 24.0,
        &format!("Actor {}", fragment.actor_ids.join(", ")),
        theme,
    ));

    out.push_str("<g class=\"edges\">");
    for edge in &fragment.operator_edges {
        out.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"/>",
            points_to_path(&edge.points),
            theme.operator_line_color,
        ));
    }
    out.push_str("</g><g class=\"nodes\">");
    for op in &fragment.operators {
        let (cx, cy) = op.center();
        let title = op
            .item
            .meta
            .get("identity")
            .and_then(|v| v.as_str())
            .unwrap_or(op.item.label());
        out.push_str(&format!(
            "<g class=\"stream-node\" transform=\"translate({cx:.2},{cy:.2})\"><circle r=\"{OPERATOR_RADIUS}\" fill=\"{}\"/><text text-anchor=\"middle\" dy=\"21.6\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" transform=\"rotate(-8)\">{}</text><title>{}</title></g>",
            theme.operator_color,
            theme.font_family,
            theme.font_size,
            theme.primary_text_color,
            escape_xml(op.item.label()),
            escape_xml(title),
        ));
    }
    out.push_str("</g></g>");
    out
}

fn caption(x: f32, y: f32, text: &str, theme: &Theme) -> String {
    format!(
        "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"end\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
        theme.font_family,
        theme.font_size,
        theme.primary_text_color,
        escape_xml(text),
    )
}

fn svg_header(width: f32, height: f32, theme: &Theme) -> String {
    let width = width.max(1.0);
    let height = height.max(1.0);
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\"><rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    )
}

fn points_to_path(points: &[Point]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
