// Colour assignment for chart series

use crate::data::Metric;

pub const REDUCED_LUNCH_COLOR: &str = "green";
pub const STANDARD_LUNCH_COLOR: &str = "red";

/// Fixed subject colours for the race comparison chart
pub fn subject_color(metric: Metric) -> &'static str {
    match metric {
        Metric::Reading => "blue",
        Metric::Writing => "red",
        Metric::Math => "green",
    }
}

/// Cycling categorical palette
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<&'static str>,
}

impl ColorPalette {
    /// D3 category10 (the plotting default for colour-by-column)
    pub fn category10() -> Self {
        Self {
            colors: vec![
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd",
                "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf",
            ],
        }
    }

    /// Pair each key with a colour, in key order, wrapping around
    pub fn assign_colors(&self, keys: &[String]) -> Vec<(String, String)> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), self.colors[i % self.colors.len()].to_string()))
            .collect()
    }
}
