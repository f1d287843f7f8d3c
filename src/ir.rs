use crate::data::{Metric, TestPrep};
use serde::Serialize;

// =============================================================================
// Engine output: shaped data plus chart metadata
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    GroupedBar,
    Histogram,
    Boxplot,
}

/// One named bar series. `categories` and `values` are parallel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    pub color: String,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
}

impl BarSeries {
    pub fn value_for(&self, category: &str) -> Option<f64> {
        self.categories
            .iter()
            .position(|c| c == category)
            .map(|i| self.values[i])
    }
}

/// A single unaggregated score with the tags the charts group by
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub value: f64,
    pub gender: String,
    pub test_prep: TestPrep,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewData {
    Bars(Vec<BarSeries>),
    Samples(Vec<Sample>),
}

/// Everything a renderer needs to draw one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedView {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub legend_title: Option<String>,
    /// Legend key -> colour, in legend order
    pub colors: Vec<(String, String)>,
    pub metric: Option<Metric>,
    pub data: ViewData,
}

impl DerivedView {
    pub fn bars(&self) -> &[BarSeries] {
        match &self.data {
            ViewData::Bars(series) => series.as_slice(),
            ViewData::Samples(_) => &[],
        }
    }

    pub fn samples(&self) -> &[Sample] {
        match &self.data {
            ViewData::Samples(samples) => samples.as_slice(),
            ViewData::Bars(_) => &[],
        }
    }

    pub fn series(&self, name: &str) -> Option<&BarSeries> {
        self.bars().iter().find(|s| s.name == name)
    }

    pub fn color_for(&self, key: &str) -> Option<&str> {
        self.colors
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, c)| c.as_str())
    }
}

/// Result of evaluating one chart. `NoData` means "render nothing".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "view", rename_all = "snake_case")]
pub enum ChartOutcome {
    View(DerivedView),
    NoData,
}

impl ChartOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ChartOutcome::NoData)
    }

    pub fn view(&self) -> Option<&DerivedView> {
        match self {
            ChartOutcome::View(v) => Some(v),
            ChartOutcome::NoData => None,
        }
    }
}
