use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub primary_color: String,
    pub primary_text_color: String,
    pub primary_border_color: String,
    pub line_color: String,
    pub selected_color: String,
    pub operator_color: String,
    pub operator_line_color: String,
    pub background: String,
}

impl Theme {
    /// Palette of the streaming dashboard.
    pub fn dashboard() -> Self {
        Self {
            font_family: "Inter, -apple-system, system-ui, sans-serif".to_string(),
            font_size: 12.0,
            primary_color: "#FFFFFF".to_string(),
            primary_text_color: "#000000".to_string(),
            primary_border_color: "#718096".to_string(),
            line_color: "#CBD5E0".to_string(),
            selected_color: "#4299E1".to_string(),
            operator_color: "#4299E1".to_string(),
            operator_line_color: "#2D3748".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            primary_color: "#F8FAFF".to_string(),
            primary_text_color: "#1C2430".to_string(),
            primary_border_color: "#C7D2E5".to_string(),
            line_color: "#7A8AA6".to_string(),
            selected_color: "#3B82F6".to_string(),
            operator_color: "#6366F1".to_string(),
            operator_line_color: "#475569".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

/// Parses `#rgb` or `#rrggbb`.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().strip_prefix('#')?;
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |idx: usize| u8::from_str_radix(expanded.get(idx..idx + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Linear mix of two colours; `amount` 0 gives `from`, 1 gives `to`.
pub fn mix_colors(from: [u8; 3], to: [u8; 3], amount: f32) -> [u8; 3] {
    let amount = amount.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for idx in 0..3 {
        let a = from[idx] as f32;
        let b = to[idx] as f32;
        out[idx] = (a + (b - a) * amount).round() as u8;
    }
    out
}
