use anyhow::{bail, Context, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Appearance {
    pub border_width: u32,
    pub gaps: u32,
    pub focused_border_color: u32,
    pub unfocused_border_color: u32,
    pub swap_border_color: u32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            border_width: 1,
            gaps: 10,
            focused_border_color: 0xC0CBFF,
            unfocused_border_color: 0x555555,
            swap_border_color: 0xFFF4C0,
        }
    }
}

/// Parses `#rrggbb` (the `#` is optional) into a pixel value.
pub fn parse_color(value: &str) -> Result<u32> {
    let hex = value.trim().trim_matches('"').trim_start_matches('#');
    if hex.len() != 6 {
        bail!("colour '{}' is not of the form #rrggbb", value.trim());
    }
    u32::from_str_radix(hex, 16).with_context(|| format!("invalid colour '{}'", value.trim()))
}
