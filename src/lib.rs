// Library exports for gradeboard

pub mod dashboard;
pub mod data;
pub mod graph;
pub mod ir;
pub mod palette;
pub mod parser;
pub mod resolve;
pub mod runtime;
pub mod selection;
pub mod transform;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    /// Histogram bin count
    #[serde(default = "default_bins")]
    pub bins: usize,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_bins() -> usize { 20 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
            bins: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_defaults_from_json() {
        let opts: RenderOptions = serde_json::from_str(r#"{"type": "svg", "bins": 8}"#).unwrap();
        assert_eq!(opts.width, 800);
        assert_eq!(opts.height, 600);
        assert_eq!(opts.format, OutputFormat::Svg);
        assert_eq!(opts.bins, 8);
    }
}
