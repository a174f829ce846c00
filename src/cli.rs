use crate::backpressure::{BackPressureMap, BackPressureSeries, Percentile};
use crate::config::{Config, load_config};
use crate::fragment::{TableFragments, layout_fragment_graph};
use crate::ir::{EdgeStyle, Item, Orientation};
use crate::layout::compute_layout;
use crate::layout_dump::{
    fragment_layout_to_json, layout_to_json, write_fragment_dump, write_layout_dump,
};
use crate::render::{render_fragment_svg, render_svg, write_output_png, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "sgl",
    version,
    about = "Layered layout for stream-processing fragment, actor and relation graphs"
)]
pub struct Args {
    /// Input JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Whether the input is a list of items or a table's fragments
    #[arg(short = 'm', long = "mode", value_enum, default_value = "items")]
    pub mode: Mode,

    /// Layout direction override: LR/horizontal or TD/vertical
    #[arg(long = "orientation")]
    pub orientation: Option<String>,

    /// Edge style override for item layouts
    #[arg(long = "edgeStyle", value_enum)]
    pub edge_style: Option<EdgeStyleArg>,

    /// JSON array of back-pressure sample series for fragment edges
    #[arg(long = "backPressure")]
    pub back_pressure: Option<PathBuf>,

    #[arg(long = "percentile", value_enum, default_value = "p50")]
    pub percentile: Percentile,

    /// Fragment to highlight
    #[arg(long = "select")]
    pub select: Option<String>,

    /// Also write the computed layout as JSON to this path
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Items,
    Fragments,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyleArg {
    Point,
    Box,
}

impl From<EdgeStyleArg> for EdgeStyle {
    fn from(arg: EdgeStyleArg) -> Self {
        match arg {
            EdgeStyleArg::Point => EdgeStyle::Point,
            EdgeStyleArg::Box => EdgeStyle::Box,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;
    let input = read_input(args.input.as_deref())?;

    let rendered = match args.mode {
        Mode::Items => render_items(&input, &args, &config)?,
        Mode::Fragments => render_fragments(&input, &args, &config)?,
    };

    match args.output_format {
        OutputFormat::Svg | OutputFormat::Json => {
            write_output_svg(&rendered, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&rendered, &output, &config.render)?;
        }
    }
    Ok(())
}

fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    if let Some(token) = args.orientation.as_deref() {
        config.layout.orientation = Orientation::from_token(token)
            .ok_or_else(|| anyhow::anyhow!("unknown orientation {token:?}"))?;
    }
    if let Some(style) = args.edge_style {
        config.layout.edge_style = style.into();
    }
    Ok(config)
}

/// Returns SVG markup, or the JSON dump for `--outputFormat json`.
fn render_items(input: &str, args: &Args, config: &Config) -> Result<String> {
    let items: Vec<Item> = serde_json::from_str(input).context("input is not a JSON array of items")?;
    let layout = compute_layout(&items, &config.layout)?;
    info!(
        nodes = layout.nodes.len(),
        edges = layout.edges.len(),
        "laid out items"
    );
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout)?;
    }
    if args.output_format == OutputFormat::Json {
        return layout_to_json(&layout);
    }
    Ok(render_svg(&layout, config.layout.edge_style, &config.theme))
}

fn render_fragments(input: &str, args: &Args, config: &Config) -> Result<String> {
    let table: TableFragments =
        serde_json::from_str(input).context("input is not a table fragments document")?;
    let layout = layout_fragment_graph(&table, &config.layout)?;
    info!(
        table = table.table_id,
        fragments = layout.fragments.len(),
        "laid out fragment graph"
    );
    if let Some(path) = args.dump_layout.as_deref() {
        write_fragment_dump(path, &layout)?;
    }
    if args.output_format == OutputFormat::Json {
        return fragment_layout_to_json(&layout);
    }

    let back_pressure = match args.back_pressure.as_deref() {
        Some(path) => Some(load_back_pressure(path, args.percentile)?),
        None => None,
    };
    Ok(render_fragment_svg(
        &layout,
        &config.layout.fragment,
        &config.theme,
        back_pressure.as_ref(),
        args.select.as_deref(),
    ))
}

fn load_back_pressure(path: &Path, percentile: Percentile) -> Result<BackPressureMap> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read back-pressure samples {}", path.display()))?;
    let series: Vec<BackPressureSeries> = serde_json::from_str(&raw)?;
    Ok(BackPressureMap::from_series(&series, percentile))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
