//! Back-pressure between fragments, as a percentage of time the upstream
//! output buffer spent blocked, and the edge styling derived from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::theme::{format_hex_color, mix_colors, parse_hex_color};

/// Green to red, indexed by back-pressure percentage.
const RAMP: [&str; 5] = ["#C6F6D5", "#68D391", "#ECC94B", "#DD6B20", "#9B2C2C"];

const MIN_EDGE_WIDTH: f32 = 2.0;
const MAX_EXTRA_WIDTH: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Percentile {
    P50,
    P90,
    P95,
    P99,
}

impl Percentile {
    pub fn fraction(self) -> f64 {
        match self {
            Percentile::P50 => 0.5,
            Percentile::P90 => 0.9,
            Percentile::P95 => 0.95,
            Percentile::P99 => 0.99,
        }
    }
}

/// Nearest-rank percentile: the sample at `floor(len * p)` after sorting.
pub fn percentile(samples: &[f64], p: Percentile) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((sorted.len() as f64) * p.fraction()).floor() as usize;
    sorted.get(idx.min(sorted.len() - 1)).copied()
}

/// Blocking-duration samples of one fragment-to-fragment channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackPressureSeries {
    pub fragment_id: String,
    pub downstream_fragment_id: String,
    /// Fractions of time blocked, `0.0..=1.0`.
    pub samples: Vec<f64>,
}

/// Back-pressure percentage keyed by `(upstream, downstream)` fragment ids.
#[derive(Debug, Clone, Default)]
pub struct BackPressureMap {
    values: HashMap<(String, String), f32>,
}

impl BackPressureMap {
    pub fn from_series(series: &[BackPressureSeries], p: Percentile) -> Self {
        let mut values = HashMap::new();
        for entry in series {
            if let Some(value) = percentile(&entry.samples, p) {
                values.insert(
                    (entry.fragment_id.clone(), entry.downstream_fragment_id.clone()),
                    (value * 100.0) as f32,
                );
            }
        }
        Self { values }
    }

    pub fn insert(&mut self, upstream: &str, downstream: &str, percent: f32) {
        self.values
            .insert((upstream.to_string(), downstream.to_string()), percent);
    }

    pub fn get(&self, upstream: &str, downstream: &str) -> Option<f32> {
        self.values
            .get(&(upstream.to_string(), downstream.to_string()))
            .copied()
    }

    /// Fragment edges run from the dependent fragment to its upstream, so the
    /// lookup flips them.
    pub fn for_edge(&self, source: &str, target: &str) -> Option<f32> {
        self.get(target, source)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn edge_width(percent: f32) -> f32 {
    MAX_EXTRA_WIDTH * (percent.clamp(0.0, 100.0) / 100.0) + MIN_EDGE_WIDTH
}

pub fn edge_color(percent: f32) -> String {
    let stops: Vec<[u8; 3]> = RAMP.iter().filter_map(|hex| parse_hex_color(hex)).collect();
    let last = stops.len() - 1;
    let position = percent.clamp(0.0, 100.0) / 100.0 * last as f32;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    format_hex_color(mix_colors(stops[low], stops[high], position - low as f32))
}
